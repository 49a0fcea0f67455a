use crate::commands::{run_qualify, run_regions, QualifyArgs, RegionsArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use prospect_qualify::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Prospect Qualification",
    about = "Qualify sales prospects against each user's location preferences",
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
    /// Qualify a prospect export once and print the outcome
    Qualify(QualifyArgs),
    /// Show the regions a location resolves to
    Regions(RegionsArgs),
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
        Command::Qualify(args) => run_qualify(args),
        Command::Regions(args) => run_regions(args),
    }
}
