mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use prospect_qualify::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
