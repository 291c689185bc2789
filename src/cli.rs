//! Command-line interface for the vault.

use std::io::{self, Write};

use clap::{Parser, Subcommand};

use crate::derive::generate_mnemonic;
use crate::vault::{AuthOutcome, Vault};

#[derive(Parser)]
#[command(name = "seedvault")]
#[command(about = "Local credential vault and authentication engine", long_about = None)]
pub struct Cli {
    /// Path to the config file
    #[arg(long, default_value = "seedvault.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new account (generates a seed phrase unless one is given)
    Create {
        /// Name for the first wallet
        #[arg(long, default_value = "Main")]
        wallet_name: String,
        /// Existing BIP-39 seed phrase to import
        #[arg(long)]
        mnemonic: Option<String>,
        /// Word count for a generated phrase (12 or 24)
        #[arg(long, default_value_t = 24)]
        words: usize,
    },
    /// Authenticate with a password and start a session
    Login,
    /// Clear the current session
    Logout,
    /// Show vault, session and throttle status
    Status,
    /// List stored accounts and their wallets
    Accounts,
    /// Wipe all stored data (accounts, passwords, session, throttle)
    Reset,
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub async fn run(vault: &Vault, command: Commands) -> Result<(), String> {
    match command {
        Commands::Create {
            wallet_name,
            mnemonic,
            words,
        } => {
            let password = prompt("Password").map_err(|e| e.to_string())?;
            let (mnemonic, generated) = match mnemonic {
                Some(m) => (m, false),
                None => (generate_mnemonic(words).map_err(|e| e.to_string())?, true),
            };
            let account = vault
                .accounts()
                .create_account(
                    &mnemonic,
                    &password,
                    &wallet_name,
                    serde_json::json!({}),
                    false,
                )
                .map_err(|e| e.to_string())?;

            println!("Account created: {}", account.id);
            if generated {
                println!("\nWrite down the seed phrase. It will not be shown again:");
                println!("  {}\n", mnemonic);
            }
            println!("You are now logged in.");
            Ok(())
        }
        Commands::Login => {
            if !vault.throttle().is_login_allowed().map_err(|e| e.to_string())? {
                let wait_ms = vault
                    .throttle()
                    .get_remaining_wait_time()
                    .map_err(|e| e.to_string())?;
                return Err(format!(
                    "Too many failed attempts. Try again in {}s.",
                    wait_ms.div_ceil(1000)
                ));
            }

            let password = prompt("Password").map_err(|e| e.to_string())?;
            match vault.try_authorize_access(&password).await {
                AuthOutcome::Success => {
                    vault
                        .throttle()
                        .clear_login_attempts()
                        .map_err(|e| e.to_string())?;
                    println!("Login successful.");
                    Ok(())
                }
                AuthOutcome::NoWallet => Err("No wallet found. Run `create` first.".to_string()),
                AuthOutcome::Error => {
                    let state = vault
                        .throttle()
                        .record_failed_login_attempt()
                        .map_err(|e| e.to_string())?;
                    Err(format!(
                        "Incorrect password (failure count: {}).",
                        state.count
                    ))
                }
            }
        }
        Commands::Logout => {
            vault
                .sessions()
                .remove_session_data()
                .map_err(|e| e.to_string())?;
            println!("Logged out.");
            Ok(())
        }
        Commands::Status => {
            let provisioned = vault.user_can_log_in().map_err(|e| e.to_string())?;
            let logged_in = vault
                .sessions()
                .user_is_logged_in()
                .map_err(|e| e.to_string())?;
            let valid = vault.sessions().is_token_valid().map_err(|e| e.to_string())?;
            let wait_ms = vault
                .throttle()
                .get_remaining_wait_time()
                .map_err(|e| e.to_string())?;

            println!("Wallet provisioned: {}", provisioned);
            println!("Session present:    {}", logged_in);
            println!("Session valid:      {}", valid);
            if wait_ms > 0 {
                println!("Login locked for:   {}s", wait_ms.div_ceil(1000));
            }
            Ok(())
        }
        Commands::Accounts => {
            let accounts = vault.accounts().get_accounts().map_err(|e| e.to_string())?;
            if accounts.is_empty() {
                println!("No accounts.");
                return Ok(());
            }
            for account in accounts {
                println!("Account {}", account.id);
                for wallet in &account.wallets {
                    let active =
                        account.settings.active_wallet_id.as_deref() == Some(wallet.id.as_str());
                    println!(
                        "  wallet {} ({}){}",
                        wallet.id,
                        wallet.name.as_deref().unwrap_or("unnamed"),
                        if active { " [active]" } else { "" }
                    );
                }
            }
            Ok(())
        }
        Commands::Reset => {
            vault.clear_stored_data().map_err(|e| e.to_string())?;
            println!("All stored data cleared.");
            Ok(())
        }
    }
}
