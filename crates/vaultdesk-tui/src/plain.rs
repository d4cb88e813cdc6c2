//! Line-mode front-end: log in at the prompt and print the vault list.
//!
//! Useful over SSH or in scripts where a full-screen UI is unwanted. Uses
//! the same session controller and token store as the TUI, so a session
//! started here is picked up by the TUI and vice versa.

use std::io::{self, Write};

use anyhow::Result;
use tracing::warn;

use vaultdesk_core::api::ApiClient;
use vaultdesk_core::auth::TokenStore;
use vaultdesk_core::config::{Config, ENV_EMAIL, ENV_PASSWORD};
use vaultdesk_core::models::Credentials;
use vaultdesk_core::session::{SessionController, SessionState};

pub async fn run(mut config: Config, api: ApiClient, store: Box<dyn TokenStore>) -> Result<()> {
    let mut session = SessionController::bootstrap_with(store, &api).await;

    if !session.state().is_authenticated() {
        print_status(session.state());

        let identifier = match std::env::var(ENV_EMAIL) {
            Ok(identifier) => identifier,
            Err(_) => prompt_identifier(config.last_identifier.as_deref())?,
        };
        let secret = match std::env::var(ENV_PASSWORD) {
            Ok(secret) => secret,
            Err(_) => rpassword::prompt_password("Password: ")?,
        };

        println!("\nAuthenticating...");
        session.login(&api, Credentials::new(identifier.trim(), secret)).await;

        if session.state().is_authenticated() {
            config.last_identifier = Some(identifier.trim().to_string());
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
        }
    }

    print_status(session.state());
    if session.state().is_authenticated() {
        print_vaults(session.state());
    }
    if !session.store_in_sync() {
        eprintln!("Warning: the session could not be saved to the token store.");
    }
    Ok(())
}

/// End the stored session without contacting the server
pub fn logout(store: Box<dyn TokenStore>) {
    let (mut session, _) = SessionController::bootstrap(store);
    session.logout();
    print_status(session.state());
}

fn prompt_identifier(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match last {
        Some(last) if input.is_empty() => last.to_string(),
        _ => input.to_string(),
    })
}

fn print_status(state: &SessionState) {
    let message = state.status_message();
    if !message.is_empty() {
        println!("{}", message);
    }
}

fn print_vaults(state: &SessionState) {
    // The status line already explains the failure
    if state.listing_failed() {
        return;
    }

    let vaults = state.vaults();
    if vaults.is_empty() {
        println!("You don't have any vaults yet.");
        return;
    }

    println!("Your vaults:");
    for vault in vaults {
        println!("  [{}] {}", vault.id, vault.name);
        if !vault.description_display().is_empty() {
            println!("      {}", vault.description_display());
        }
    }
}
