use crate::demo::{run_demo, run_performance_report, DemoArgs, PerformanceArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use dairy_coop::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Dairy Cooperative Back Office",
    about = "Score farmer performance and run cooperative deductions from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score farmers from a collection CSV export and print the dashboard
    Performance(PerformanceArgs),
    /// Seed an in-memory cooperative, print its dashboard, and run a deduction cycle
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Performance(args) => run_performance_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
