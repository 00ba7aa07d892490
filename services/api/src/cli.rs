use crate::demo::{run_demo, run_evaluate, run_trend, DemoArgs, EvaluateArgs, TrendArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loan_review::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "loan-review",
    about = "Review loan applications for fraud, SLA, and rate acceptability",
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
    /// Review a single application read from a JSON file
    Evaluate(EvaluateArgs),
    /// Summarize a batch of applications read from a JSON array
    Trend(TrendArgs),
    /// Walk through a rejected and an approved application with a pinned rate
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
        // Rate lookups and webhook delivery use blocking HTTP clients.
        Command::Evaluate(args) => tokio::task::block_in_place(|| run_evaluate(args)),
        Command::Trend(args) => run_trend(args),
        Command::Demo(args) => run_demo(args),
    }
}
