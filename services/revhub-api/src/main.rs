use revhub_api::{run_server, telemetry};
use revhub_core::RevhubConfig;

#[tokio::main]
async fn main() {
    let config = match RevhubConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let guard = match telemetry::init_telemetry(&config.telemetry) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(err) = run_server(config).await {
        tracing::error!(error = %err, "Server terminated with error");
        drop(guard);
        std::process::exit(1);
    }

    // Guard is dropped here, flushing pending spans
}
