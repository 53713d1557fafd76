use clap::{Args, Parser, Subcommand};
use watchyard::error::AppError;

use crate::demo::{run_demo, run_sign_webhook, DemoArgs, SignWebhookArgs};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "watchyard",
    about = "Moderation and identity-verification core for a vintage watch marketplace",
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
    /// Walk the moderation and verification lifecycles against an in-memory store
    Demo(DemoArgs),
    /// Compute the webhook signature for a payload, for manual callback testing
    SignWebhook(SignWebhookArgs),
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
        Command::Demo(args) => run_demo(args),
        Command::SignWebhook(args) => run_sign_webhook(args),
    }
}
