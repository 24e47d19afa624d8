//! Authentication command handlers

use super::require_session;
use crate::error::Result;
use crate::output::{json_output, print_field, print_info, print_success};
use anistream_sdk::{AniStreamClient, Credential};
use serde_json::json;
use tracing::debug;

/// Handle login command
pub async fn handle_login(
    client: &AniStreamClient,
    email: &str,
    password: &str,
    json: bool,
) -> Result<()> {
    debug!("Signing in as {}", email);
    let credential = client.login(email, password).await?;
    report_signed_in(&credential, email, json)
}

/// Handle register command
pub async fn handle_register(
    client: &AniStreamClient,
    email: &str,
    password: &str,
    json: bool,
) -> Result<()> {
    debug!("Registering {}", email);
    let credential = client.register(email, password).await?;
    report_signed_in(&credential, email, json)
}

fn report_signed_in(credential: &Credential, email: &str, json: bool) -> Result<()> {
    let email = credential.email.as_deref().unwrap_or(email);
    if json {
        return json_output(&json!({ "id": credential.id, "email": email }));
    }
    print_success(&format!("Signed in as {email}"));
    Ok(())
}

/// Handle logout command
pub async fn handle_logout(client: &AniStreamClient) -> Result<()> {
    if client.store().auth().is_none() {
        print_info("Not signed in");
        return Ok(());
    }

    client.logout().await;
    print_success("Signed out");
    Ok(())
}

/// Handle whoami command
pub async fn handle_whoami(client: &AniStreamClient, json: bool) -> Result<()> {
    require_session(client)?;
    let profile = client.me().await?;

    if json {
        return json_output(&profile);
    }

    print_field("Email", Some(profile.email.as_str()));
    print_field("ID", Some(profile.id.to_string().as_str()));
    print_field("Avatar", profile.avatar.as_deref());
    print_field(
        "Member since",
        Some(profile.created_at.format("%Y-%m-%d").to_string().as_str()),
    );
    if !profile.is_active {
        print_info("This account is deactivated");
    }
    Ok(())
}
