use std::env;
use std::path::PathBuf;

use thermosync_reporter::run;
use thermosync_reporter::settings::Settings;

#[tokio::main]
async fn main() {
    let config_path = env::args_os().nth(1).map(PathBuf::from);
    let settings = Settings::load(config_path.as_deref()).expect("Failed to load settings.");

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let app_name = env!("CARGO_PKG_NAME").replace('-', "_");
            let level = settings.logger.level.as_str();

            let mut directives = vec![format!("{app_name}={level}"), format!("thermosync_core={level}")];
            directives.extend(settings.sensor_log_directives());

            directives.join(",").into()
        }))
        .init();

    if let Err(e) = run(config_path, settings).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}
