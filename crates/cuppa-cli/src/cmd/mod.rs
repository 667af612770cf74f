//! Command handlers for the `cup` binary.
//!
//! Every handler wires the engine the same way: load config, resolve the
//! acting user, open the file store, construct a [`LiveView`], bind the
//! requested scope, and pump the initial snapshot. The [`Host`] struct
//! carries that wiring; commands only decide what to do with it.

pub mod add;
pub mod edit;
pub mod init;
pub mod list;
pub mod map;
pub mod price;
pub mod rate;
pub mod rm;
pub mod show;

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Result;
use cuppa_core::session::FixedIdentity;
use cuppa_core::{EngineError, LiveView, PermissionGate, ViewScope};

use crate::config::{self, CliConfig};
use crate::identity;
use crate::output::{CliError, OutputMode, render_error};
use crate::store_file::FileStore;

/// Which scope the invocation asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeChoice {
    /// Explicit `--shared`.
    Shared,
    /// Explicit `--private`.
    Private,
    /// Neither flag: follow config.
    Default,
}

/// Everything a handler needs to reach the engine.
pub struct Host {
    pub view: LiveView,
    pub scope: ViewScope,
}

/// Resolved global options, passed down from `main`.
pub struct HostOpts {
    pub user_flag: Option<String>,
    pub data_flag: Option<PathBuf>,
    pub config_flag: Option<PathBuf>,
    pub scope: ScopeChoice,
}

impl HostOpts {
    fn resolve(&self) -> Result<(CliConfig, Option<String>, PathBuf)> {
        let config = CliConfig::load(self.config_flag.as_deref())?;
        let user = identity::resolve_user(self.user_flag.as_deref(), config.user.as_deref());
        let data_path = self
            .data_flag
            .clone()
            .or_else(|| config.data_path.clone())
            .unwrap_or_else(config::default_data_path);
        Ok((config, user, data_path))
    }
}

/// Wire a [`LiveView`] over the file store and bind the chosen scope.
pub fn open_view(opts: &HostOpts, output: OutputMode) -> Result<Host> {
    let (config, user, data_path) = opts.resolve()?;

    let shared = match opts.scope {
        ScopeChoice::Shared => true,
        ScopeChoice::Private => false,
        ScopeChoice::Default => config.shared_by_default,
    };
    let scope = if shared {
        ViewScope::Shared
    } else {
        let Some(owner) = user.clone() else {
            let err = CliError::new(
                "a private view needs an identity; pass --user, set CUPPA_USER, or run `cup init`",
                "E2001",
            );
            render_error(output, &err)?;
            anyhow::bail!("{}", err.message);
        };
        ViewScope::Private(owner)
    };

    let store = FileStore::open(&data_path).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let session = identity::session_for(user.as_deref());
    let gate = PermissionGate::new(config.curator.clone());
    let mut view = LiveView::new(Rc::new(store), FixedIdentity::handle(session), gate);

    if let Err(err) = view.bind(scope.clone()) {
        return Err(fail(output, &err));
    }
    if let Err(err) = view.pump() {
        return Err(fail(output, &err));
    }

    Ok(Host { view, scope })
}

/// Render an engine error and convert it for `main`'s exit path.
pub fn fail(output: OutputMode, err: &EngineError) -> anyhow::Error {
    let cli = CliError::from_engine(err);
    let _ = render_error(output, &cli);
    anyhow::anyhow!("{}", cli.message)
}
