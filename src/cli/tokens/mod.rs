//! Tokens command - API token administration

use clap::Subcommand;

#[derive(Subcommand)]
pub enum TokensCommand {
    /// Issue a token for an existing user and print it once
    Issue {
        username: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// List a user's tokens without their secrets
    List { username: String },

    /// Revoke a token by its raw value
    Revoke { token: String },
}

pub async fn run(command: TokensCommand) -> anyhow::Result<()> {
    let (_, state) = super::bootstrap().await?;
    let tokens = &state.tokens;

    match command {
        TokensCommand::Issue {
            username,
            description,
        } => {
            let issued = tokens.issue_token(&username, &description).await?;
            super::print_json(&issued)?;
            eprintln!("Store this token now; it cannot be shown again.");
        }
        TokensCommand::List { username } => {
            super::print_json(&tokens.list_tokens(&username).await?)?;
        }
        TokensCommand::Revoke { token } => {
            tokens.revoke_token(token.trim()).await?;
            println!("Token revoked successfully");
        }
    }

    Ok(())
}
