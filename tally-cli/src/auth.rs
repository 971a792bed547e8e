use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};

use crate::state::ensure_tally_home;

/// Environment variable consulted before the persisted auth file.
pub const TOKEN_ENV: &str = "TODOIST_API_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthState {
    pub todoist_token: Option<String>,
}

fn auth_path() -> Result<std::path::PathBuf> {
    Ok(ensure_tally_home()?.join("auth.json"))
}

pub fn load_auth() -> Result<AuthState> {
    let p = auth_path()?;
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    Ok(serde_json::from_str(&s)?)
}

pub fn save_auth(auth: &AuthState) -> Result<()> {
    let p = auth_path()?;
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Resolve the API token: environment first, then the persisted auth file.
pub fn resolve_token() -> Result<String> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        let token = token.trim().to_string();
        if !token.is_empty() {
            return Ok(token);
        }
    }
    if let Some(token) = load_auth()?.todoist_token {
        if !token.trim().is_empty() {
            return Ok(token);
        }
    }
    bail!(
        "No Todoist API token found. Set {TOKEN_ENV} or run: tally auth paste-token\n\
(Your token lives at Todoist Settings -> Integrations.)"
    )
}

fn prompt_secret(label: &str) -> Result<String> {
    // Minimal portable secret prompt: just stdin.
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

pub fn paste_token() -> Result<()> {
    let mut auth = load_auth()?;
    let token = prompt_secret("Paste Todoist API token")?;
    if token.is_empty() {
        bail!("empty token");
    }
    auth.todoist_token = Some(token);
    save_auth(&auth)?;
    println!("Saved Todoist token to ~/.tally/auth.json");
    Ok(())
}
