//! neonctl - Neon Learn command-line client

use anyhow::{anyhow, Result};
use clap::Parser;
use neonctl::cli::{Cli, Commands, DEFAULT_SERVER};
use neonctl::client::NeonClient;
use neonctl::output;
use neonctl::session::Session;
use std::path::Path;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        output::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let session_path = Session::default_path()
        .ok_or_else(|| anyhow!("Cannot determine config directory for the session file"))?;
    let session = Session::load_from(&session_path);

    let server = cli
        .server
        .clone()
        .or_else(|| session.as_ref().map(|s| s.server.clone()))
        .unwrap_or_else(|| DEFAULT_SERVER.to_string());
    let client = NeonClient::new(&server);
    let token = session.as_ref().and_then(|s| s.token_for(client.base_url()));
    let client = client.with_token(token);

    match cli.command {
        Commands::Register { username, password } => {
            let response = client.register(&username, &password).await?;
            save_session(&session_path, &client, &response.user.username, &response.token)?;
            output::display_auth(&response);
        }
        Commands::Login { username, password } => {
            let response = client.login(&username, &password).await?;
            save_session(&session_path, &client, &response.user.username, &response.token)?;
            output::display_auth(&response);
        }
        Commands::Logout => {
            if Session::clear(&session_path)? {
                println!("Logged out.");
            } else {
                println!("No saved session.");
            }
        }
        Commands::Progress { json } => {
            let progress = client.progress().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&progress)?);
            } else {
                output::display_progress(&progress);
            }
        }
        Commands::Complete { lesson_id } => {
            let response = client.complete_lesson(&lesson_id).await?;
            output::display_completion(&response);
        }
        Commands::Health => {
            let health = client.health().await?;
            output::display_health(&health);
        }
    }

    Ok(())
}

fn save_session(path: &Path, client: &NeonClient, username: &str, token: &str) -> Result<()> {
    Session {
        server: client.base_url().to_string(),
        username: username.to_string(),
        token: token.to_string(),
    }
    .save_to(path)
}
