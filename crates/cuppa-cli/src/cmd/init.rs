//! `cup init` — bootstrap the config file and an empty catalog.

use std::fs;

use anyhow::Context;
use clap::Args;

use crate::cmd::HostOpts;
use crate::config::{self, CliConfig};
use crate::identity;
use crate::output::{OutputMode, render_json, render_success};
use crate::store_file::FileStore;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Curator identity for the shared list.
    #[arg(long)]
    pub curator: Option<String>,

    /// Open the shared view by default.
    #[arg(long)]
    pub shared_by_default: bool,
}

pub fn run_init(args: &InitArgs, opts: &HostOpts, output: OutputMode) -> anyhow::Result<()> {
    let existing = CliConfig::load(opts.config_flag.as_deref())?;
    let user = identity::resolve_user(opts.user_flag.as_deref(), existing.user.as_deref());
    let data_path = opts
        .data_flag
        .clone()
        .or_else(|| existing.data_path.clone())
        .unwrap_or_else(config::default_data_path);

    let store = FileStore::open(&data_path).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let created_catalog = store.init().map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let config = CliConfig {
        user: user.clone(),
        curator: args.curator.clone().or(existing.curator),
        data_path: Some(data_path.clone()),
        shared_by_default: args.shared_by_default || existing.shared_by_default,
    };
    let config_path = opts
        .config_flag
        .clone()
        .or_else(config::default_config_path);
    let mut wrote_config = false;
    if let Some(path) = &config_path {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create config dir {}", parent.display()))?;
        }
        fs::write(path, config.to_toml()?)
            .with_context(|| format!("write config {}", path.display()))?;
        wrote_config = true;
    }

    if output.is_json() {
        render_json(&serde_json::json!({
            "catalog": data_path,
            "catalog_created": created_catalog,
            "config": config_path,
            "config_written": wrote_config,
            "user": user,
        }))?;
    } else {
        let verb = if created_catalog { "Created" } else { "Found" };
        render_success(output, &format!("{verb} catalog at {}", data_path.display()))?;
        if let Some(path) = &config_path {
            render_success(output, &format!("Wrote config to {}", path.display()))?;
        }
        match user {
            Some(user) => render_success(output, &format!("Acting as {user}"))?,
            None => render_success(
                output,
                "No identity resolved — set user in the config or pass --user",
            )?,
        }
    }
    Ok(())
}
