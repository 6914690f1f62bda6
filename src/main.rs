use clap::Parser;
use model_dashboard::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Users(command) => cli::users::run(command).await,
        Command::Tokens(command) => cli::tokens::run(command).await,
        Command::Models(command) => cli::models::run(command).await,
    }
}
