use std::collections::VecDeque;

use crate::config::SmoothingMode;
use crate::convert::round_to;

/// Bounded history of recent valid readings, oldest at the front.
///
/// Slots that have not been filled yet are simply absent from the deque, so
/// aggregates only ever see readings that were actually pushed.
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    readings: VecDeque<f64>,
    capacity: usize,
    mode: SmoothingMode,
    precision: u32,
}

impl SmoothingWindow {
    pub fn new(mode: SmoothingMode, capacity: usize, precision: u32) -> Self {
        // Without smoothing only the latest reading is ever needed
        let capacity = match mode {
            SmoothingMode::None => 1,
            _ => capacity.max(1),
        };

        Self {
            readings: VecDeque::with_capacity(capacity),
            capacity,
            mode,
            precision,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.readings.len() == self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(value);
    }

    pub fn reduce(&self) -> Option<f64> {
        if self.readings.is_empty() {
            return None;
        }

        match self.mode {
            SmoothingMode::None => self.readings.back().copied(),
            SmoothingMode::Mean => {
                let sum: f64 = self.readings.iter().sum();
                Some(round_to(sum / self.readings.len() as f64, self.precision))
            }
            SmoothingMode::Median => {
                let mut sorted: Vec<f64> = self.readings.iter().copied().collect();
                sorted.sort_by(f64::total_cmp);

                let half = sorted.len() / 2;
                let median = if sorted.len() % 2 == 0 {
                    (sorted[half - 1] + sorted[half]) / 2.0
                } else {
                    sorted[half]
                };

                Some(round_to(median, self.precision))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn mode(&self) -> SmoothingMode {
        self.mode
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.readings.iter().copied()
    }
}
