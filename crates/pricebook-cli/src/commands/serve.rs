use std::process::ExitCode;

use pricebook_core::Warehouse;
use pricebook_web::AppState;
use tokio::net::TcpListener;

use crate::cli::ServeArgs;
use crate::config::ServiceConfig;
use crate::error::CliError;

pub async fn run(args: &ServeArgs, config: &ServiceConfig) -> Result<ExitCode, CliError> {
    let warehouse = Warehouse::open(config.warehouse.clone())?;
    let listener = match TcpListener::bind(args.bind).await {
        Ok(listener) => listener,
        Err(error) => {
            warehouse.close();
            return Err(error.into());
        }
    };

    let state = AppState::new(warehouse.clone());
    let served = pricebook_web::serve(listener, state, shutdown_signal()).await;
    warehouse.close();
    served?;

    Ok(ExitCode::SUCCESS)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received, draining requests"),
        Err(error) => {
            tracing::warn!(%error, "cannot listen for ctrl-c; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
