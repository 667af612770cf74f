//! User identity resolution for CLI commands.
//!
//! The resolution chain: `--user` flag > `CUPPA_USER` env > config `user` >
//! `USER` env (TTY only). Mutating commands and private views need an
//! identity; the shared view can be browsed anonymously.

use std::env;
use std::io::IsTerminal;

use cuppa_core::Session;

/// Core resolution logic, parameterized for tests.
fn resolve_user_inner(
    cli_flag: Option<&str>,
    env_user: Option<&str>,
    config_user: Option<&str>,
    os_user: Option<&str>,
    is_tty: bool,
) -> Option<String> {
    if let Some(user) = cli_flag.filter(|u| !u.is_empty()) {
        return Some(user.to_string());
    }
    if let Some(user) = env_user.filter(|u| !u.is_empty()) {
        return Some(user.to_string());
    }
    if let Some(user) = config_user.filter(|u| !u.is_empty()) {
        return Some(user.to_string());
    }
    // OS login name only on an interactive terminal; scripts must be
    // explicit about who is writing.
    if is_tty {
        if let Some(user) = os_user.filter(|u| !u.is_empty()) {
            return Some(user.to_string());
        }
    }
    None
}

/// Resolve the acting user, if any.
pub fn resolve_user(cli_flag: Option<&str>, config_user: Option<&str>) -> Option<String> {
    let env_user = env::var("CUPPA_USER").ok();
    let os_user = env::var("USER").ok();
    let is_tty = std::io::stdin().is_terminal();
    resolve_user_inner(
        cli_flag,
        env_user.as_deref(),
        config_user,
        os_user.as_deref(),
        is_tty,
    )
}

/// The session for a resolved user: authenticated when known, anonymous
/// otherwise.
pub fn session_for(user: Option<&str>) -> Session {
    match user {
        Some(id) => Session::authenticated(id),
        None => Session::anonymous("anonymous"),
    }
}
