// Account commands

use crate::app::App;
use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Sign in and keep the session for later commands
    SignIn {
        email: String,

        #[arg(long, env = "MCHBILL_USER_PASSWORD")]
        password: String,
    },

    /// Create a billing clerk account and sign it in
    SignUp {
        email: String,

        #[arg(long, env = "MCHBILL_USER_PASSWORD")]
        password: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,
    },

    /// End the current session
    SignOut,

    /// Show the signed-in account
    Whoami,

    /// List accounts
    Users,
}

pub async fn run(app: &App, command: AuthCommand) -> Result<()> {
    match command {
        AuthCommand::SignIn { email, password } => {
            let user = app.auth.sign_in(&email, &password).await?;
            println!("Signed in as {} ({})", user.email, user.role);
        }
        AuthCommand::SignUp { email, password, name } => {
            let user = app.auth.sign_up(&email, &password, name.as_deref()).await?;
            println!("Created {} ({})", user.email, user.role);
        }
        AuthCommand::SignOut => {
            app.auth.sign_out().await?;
            println!("Signed out");
        }
        AuthCommand::Whoami => match app.auth.current_user().await {
            Some(user) => println!(
                "{} {} ({})",
                user.email,
                user.full_name.as_deref().unwrap_or(""),
                user.role
            ),
            None => println!("Not signed in"),
        },
        AuthCommand::Users => {
            app.require_admin().await?;
            for user in app.auth.users().await {
                println!("{:<40} {:<28} {}", user.id, user.email, user.role);
            }
        }
    }
    Ok(())
}
