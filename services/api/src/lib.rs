mod cli;
mod dashboard;
mod infra;
mod routes;
mod server;

use dealer_kpi::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
