//! Shared output layer for pretty/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: pretty output for humans, stable JSON for scripts.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` / hidden `--json` flag
//! 2. `FORMAT` env var → `"pretty"` | `"json"`
//! 3. Default: pretty if stdout is a TTY, JSON if piped.

use std::io::{self, IsTerminal, Write};

use clap::ValueEnum;
use cuppa_core::EngineError;
use serde::Serialize;

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 64;

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (tables, key/value sections).
    Pretty,
    /// Machine-readable JSON, one object or array per result.
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Core resolution logic, separated from I/O for testability.
fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }
    if json_flag {
        return OutputMode::Json;
    }
    if let Some(val) = format_env {
        match val.to_lowercase().as_str() {
            "json" => return OutputMode::Json,
            "pretty" => return OutputMode::Pretty,
            _ => {} // unknown value — fall through to TTY detection
        }
    }
    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Json
    }
}

/// Resolve the output mode from CLI flags, environment, and TTY defaults.
pub fn resolve_output_mode(format_flag: Option<OutputMode>, json_flag: bool) -> OutputMode {
    let env_val = std::env::var("FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(format_flag, json_flag, env_val.as_deref(), is_tty)
}

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A CLI-facing error with machine code and optional hint.
#[derive(Debug, Clone, Serialize)]
pub struct CliError {
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl CliError {
    /// Build from an engine error, carrying its stable code and hint.
    pub fn from_engine(err: &EngineError) -> Self {
        let code = err.code();
        Self {
            message: err.to_string(),
            code: code.code().to_string(),
            hint: code.hint().map(ToOwned::to_owned),
        }
    }

    /// A plain CLI error outside the engine taxonomy.
    pub fn new(message: impl Into<String>, code: &str) -> Self {
        Self {
            message: message.into(),
            code: code.to_string(),
            hint: None,
        }
    }
}

/// Render an error to stderr in the active mode.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let mut err = io::stderr().lock();
    if mode.is_json() {
        serde_json::to_writer(&mut err, &serde_json::json!({ "error": error }))?;
        writeln!(err)?;
    } else {
        writeln!(err, "error[{}]: {}", error.code, error.message)?;
        if let Some(hint) = &error.hint {
            writeln!(err, "  hint: {hint}")?;
        }
    }
    Ok(())
}

/// Render a success line (pretty) or `{"ok": ...}` object (JSON).
pub fn render_success(mode: OutputMode, message: &str) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    if mode.is_json() {
        serde_json::to_writer(&mut out, &serde_json::json!({ "ok": message }))?;
        writeln!(out)?;
    } else {
        writeln!(out, "{message}")?;
    }
    Ok(())
}

/// Serialize any value as a JSON line to stdout.
pub fn render_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
