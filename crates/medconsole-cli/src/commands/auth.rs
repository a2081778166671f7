use anyhow::{Context, Result};
use colored::Colorize;
use medconsole_client::{Console, FileStorage, KeyValueStorage};
use medconsole_core::{LoginRequest, RegisterRequest};

use super::report;
use crate::cli::{LoginArgs, RegisterArgs};
use crate::config::SERVER_KEY;
use crate::output::{print_error, print_success, print_warning};

pub async fn login(console: &Console, args: &LoginArgs, profile: &str) -> Result<()> {
    let username = args
        .username
        .as_deref()
        .context("--username is required")?;
    let password = args
        .password
        .as_deref()
        .context("--password is required")?;

    let identity = console
        .auth
        .login(&LoginRequest::new(username, password))
        .await
        .map_err(report)?;

    let server = console.config().base_url.clone();
    FileStorage::durable(profile)?.set(SERVER_KEY, &server)?;

    let who = identity
        .map(|i| i.display_name.unwrap_or(i.username))
        .unwrap_or_else(|| username.trim().to_string());
    print_success(&format!("Logged in to {} as {}", server.cyan(), who.cyan()));
    Ok(())
}

pub async fn register(console: &Console, args: &RegisterArgs) -> Result<()> {
    let request = RegisterRequest {
        name: args.name.clone(),
        username: args.username.clone(),
        password: args.password.clone(),
        confirm_password: args.confirm_password.clone(),
    };
    let message = console.auth.register(&request).await.map_err(report)?;
    print_success(&message);
    println!("Sign in with: {}", "medconsole login -u <username>".cyan());
    Ok(())
}

pub async fn logout(console: &Console, profile: &str) -> Result<()> {
    if !console.session().is_authenticated() {
        println!("No session found for profile \"{profile}\"");
        return Ok(());
    }
    if let Err(e) = console.auth.logout().await {
        print_warning(&format!("Server logout failed: {e}"));
    }
    FileStorage::durable(profile)?.remove(SERVER_KEY)?;
    print_success("Logged out (session removed)");
    Ok(())
}

pub async fn refresh(console: &Console) -> Result<()> {
    console.auth.refresh().await?;
    print_success("Access token refreshed");
    Ok(())
}

fn preview(token: &str) -> String {
    if token.len() > 20 {
        format!("{}...{}", &token[..8], &token[token.len() - 8..])
    } else {
        token.to_string()
    }
}

pub fn whoami(console: &Console, profile: &str) -> Result<()> {
    let session = console.session();
    let Some(token) = session.token() else {
        print_error(&format!("Not logged in (profile: \"{profile}\")"));
        return Ok(());
    };

    println!("{}: {}", "Profile".cyan(), profile);
    println!("{}: {}", "Server".cyan(), console.config().base_url);
    if let Some(identity) = session.identity() {
        match identity.display_name {
            Some(name) => println!("{}: {} ({})", "User".cyan(), identity.username, name),
            None => println!("{}: {}", "User".cyan(), identity.username),
        }
    }
    println!("{}: Bearer (token: {})", "Auth".cyan(), preview(&token));
    println!(
        "{}: {}",
        "Refresh".cyan(),
        if session.refresh_token().is_some() { "available" } else { "none" }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_preview() {
        assert_eq!(preview("short"), "short");
        assert_eq!(
            preview("abcdefgh-0123456789-ijklmnop"),
            "abcdefgh...ijklmnop"
        );
    }
}
