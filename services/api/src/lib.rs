mod cli;
mod infra;
mod routes;
mod scoring;
mod server;

use cardio_severity::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
