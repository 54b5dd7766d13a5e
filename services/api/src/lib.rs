mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use dairy_coop::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
