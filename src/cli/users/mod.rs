//! Users command - local account administration

use std::io::BufRead;

use anyhow::Context;
use clap::{Args, Subcommand};

use crate::infrastructure::user::CreateUserRequest;

#[derive(Subcommand)]
pub enum UsersCommand {
    /// Create a local user
    Create(CreateUserArgs),

    /// List all users
    List,

    /// Allow a user to log in again
    Enable { username: String },

    /// Block logins and end the user's sessions
    Disable { username: String },

    /// Set a new password
    ResetPassword {
        username: String,
        /// New password; read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Delete a user together with its tokens and sessions
    Delete { username: String },
}

#[derive(Args)]
pub struct CreateUserArgs {
    pub username: String,

    /// Password; read from stdin when omitted
    #[arg(long)]
    pub password: Option<String>,

    #[arg(long)]
    pub display_name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,
}

pub async fn run(command: UsersCommand) -> anyhow::Result<()> {
    let (_, state) = super::bootstrap().await?;
    let users = &state.users;

    match command {
        UsersCommand::Create(args) => {
            let password = password_or_stdin(args.password)?;
            let user = users
                .create_local_user(CreateUserRequest {
                    username: args.username,
                    password,
                    display_name: args.display_name,
                    email: args.email,
                })
                .await?;
            println!("Created user '{}'", user.username());
        }
        UsersCommand::List => {
            super::print_json(&users.list_users().await?)?;
        }
        UsersCommand::Enable { username } => {
            users.set_active(&username, true).await?;
            println!("Enabled user '{}'", username);
        }
        UsersCommand::Disable { username } => {
            users.set_active(&username, false).await?;
            println!("Disabled user '{}'", username);
        }
        UsersCommand::ResetPassword { username, password } => {
            let password = password_or_stdin(password)?;
            users.reset_password(&username, &password).await?;
            println!("Password reset for '{}'", username);
        }
        UsersCommand::Delete { username } => {
            let tokens = users.delete_user(&username).await?;
            println!("Deleted user '{}' and {} token(s)", username, tokens);
        }
    }

    Ok(())
}

fn password_or_stdin(password: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
