use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use meetsched_core::{LogConfig, init_logging};
use meetsched_server::config::AppConfig;
use meetsched_server::service::CalendarService;
use meetsched_server::{AppState, router};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    if let Err(e) = init_logging(LogConfig::from_env()) {
        eprintln!("failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    config.ensure_config_dir()?;
    config.validate_credentials()?;

    info!(
        calendar = %config.calendar_id,
        service_account = config.use_service_account,
        "starting meeting scheduler"
    );

    let service = CalendarService::new(config.google_config())
        .map_err(|e| format!("failed to initialize calendar service: {}", e))?;

    let addr = config.bind_addr()?;
    let state = AppState {
        config,
        service: Arc::new(service),
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
