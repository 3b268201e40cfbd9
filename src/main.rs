//! FixBoard admin console.
//!
//! A thin command-line driver around the session core: login/logout, the
//! app-start auth check, and arbitrary resource calls through the session
//! gateway. All screens of the web dashboard consume the same core; this
//! binary exercises it without any UI layer.

mod api;
mod auth;
mod config;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use reqwest::Method;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use api::{ApiError, CallOptions, Gateway};
use auth::{check_auth, AuthCheck, FileCredentialStore, SavedLogin, Session};
use config::Config;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    let mut config = Config::load()?;
    let store = Arc::new(FileCredentialStore::new(Config::state_dir()?));
    let gateway = Gateway::new(config.api_base_url(), store)?;
    let mut session = Session::new(gateway);

    match command {
        "login" => cmd_login(&mut session, &mut config, &args[2..]).await,
        "logout" => cmd_logout(&mut session, &config, &args[2..]).await,
        "whoami" => cmd_whoami(&session),
        "call" => cmd_call(&mut session, &config, &args[2..]).await,
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            print_usage();
            Err(anyhow!("unknown command: {}", other))
        }
    }
}

fn print_usage() {
    eprintln!("fixboard - admin console for the FixBoard marketplace");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  fixboard login [email] [--remember]   Log in (prompts for password)");
    eprintln!("  fixboard logout [--forget]            Log out; --forget drops the saved login");
    eprintln!("  fixboard whoami                       Show the stored identity");
    eprintln!("  fixboard call <METHOD> <endpoint> [json-body]");
    eprintln!("                                        Call a resource endpoint, e.g.");
    eprintln!("                                        fixboard call GET /bookings");
}

async fn cmd_login(session: &mut Session, config: &mut Config, args: &[String]) -> Result<()> {
    let remember = args.iter().any(|a| a == "--remember");
    let email = match args.iter().find(|a| !a.starts_with("--")) {
        Some(email) => email.clone(),
        None => match config.last_email.clone() {
            Some(email) => email,
            None => prompt_line("Email: ")?,
        },
    };

    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    let user = session.login(&email, &password).await?;
    println!("Logged in as {} (id {})", user.name, user.id);

    config.last_email = Some(email.clone());
    if let Err(e) = config.save() {
        warn!(error = %e, "failed to save config");
    }

    if remember {
        SavedLogin::store(&email, &password)?;
        info!(email = %email, "login saved to keychain");
    }

    Ok(())
}

async fn cmd_logout(session: &mut Session, config: &Config, args: &[String]) -> Result<()> {
    session.logout().await?;
    println!("Logged out");

    if args.iter().any(|a| a == "--forget") {
        if let Some(ref email) = config.last_email {
            if SavedLogin::exists(email) {
                SavedLogin::delete(email)?;
                println!("Saved login removed");
            }
        }
    }

    Ok(())
}

fn cmd_whoami(session: &Session) -> Result<()> {
    match check_auth(session.gateway().store().as_ref()) {
        AuthCheck::Authenticated(user) => {
            println!("{} (id {})", user.name, user.id);
            Ok(())
        }
        AuthCheck::Anonymous => {
            println!("not logged in");
            Ok(())
        }
    }
}

async fn cmd_call(session: &mut Session, config: &Config, args: &[String]) -> Result<()> {
    let method = args
        .first()
        .ok_or_else(|| anyhow!("missing METHOD (e.g. GET, POST)"))?;
    let method = parse_method(method)?;
    let endpoint = args
        .get(1)
        .ok_or_else(|| anyhow!("missing endpoint (e.g. /bookings)"))?
        .clone();

    let options = match args.get(2) {
        Some(raw) => {
            let body: serde_json::Value =
                serde_json::from_str(raw).context("Body is not valid JSON")?;
            CallOptions::json(body)
        }
        None => CallOptions::default(),
    };

    let result = session
        .gateway()
        .call(method.clone(), &endpoint, options)
        .await;

    let response = match result {
        Ok(response) => response,
        // Session missing or rejected: try the saved login once, then retry
        Err(e @ (ApiError::MissingCredential | ApiError::AuthRejected { .. })) => {
            if !reauthenticate(session, config).await? {
                return Err(e.into());
            }
            let options = match args.get(2) {
                Some(raw) => CallOptions::json(serde_json::from_str(raw)?),
                None => CallOptions::default(),
            };
            session.gateway().call(method, &endpoint, options).await?
        }
        Err(e) => return Err(e.into()),
    };

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    println!("{}", status);
    if !body.is_empty() {
        println!("{}", body);
    }

    Ok(())
}

/// Re-establish a session from the keychain-saved login, if one exists.
async fn reauthenticate(session: &mut Session, config: &Config) -> Result<bool> {
    let Some(email) = config.last_email.clone().or_else(|| config.admin_email()) else {
        return Ok(false);
    };
    let Ok(password) = SavedLogin::get_password(&email) else {
        return Ok(false);
    };

    match session.login(&email, &password).await {
        Ok(user) => {
            info!(user = %user.name, "re-authenticated from saved login");
            Ok(true)
        }
        Err(e) => {
            warn!(error = %e, "re-authentication from saved login failed");
            Ok(false)
        }
    }
}

fn parse_method(raw: &str) -> Result<Method> {
    Method::from_bytes(raw.to_uppercase().as_bytes())
        .map_err(|_| anyhow!("invalid HTTP method: {}", raw))
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method("DELETE").unwrap(), Method::DELETE);
        assert_eq!(parse_method("Patch").unwrap(), Method::PATCH);
        assert!(parse_method("not a method").is_err());
    }
}
