use crate::evaluate::{run_evaluate, run_validate, EvaluateArgs, ValidateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use garden::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "garden",
    about = "Derive garden state from sensor readings and decide when it needs attention",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service and the periodic evaluation loop (default command)
    Serve(ServeArgs),
    /// Run a single evaluation cycle over readings exported to CSV
    Evaluate(EvaluateArgs),
    /// Load and validate the policy and sensor files
    Validate(ValidateArgs),
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
        Command::Evaluate(args) => run_evaluate(args),
        Command::Validate(args) => run_validate(args),
    }
}
