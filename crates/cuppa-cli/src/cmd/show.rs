//! `cup show` — one shop in full, with the session's capabilities.

use std::io::{self, Write};

use clap::Args;
use cuppa_core::permissions::describe_capabilities;
use cuppa_core::{Category, EngineError};

use crate::cmd::{Host, fail};
use crate::output::{OutputMode, pretty_kv, pretty_rule, render_json};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Item id (as printed by `cup list`).
    pub id: String,
}

pub fn run_show(args: &ShowArgs, host: &mut Host, output: OutputMode) -> anyhow::Result<()> {
    let Some(item) = host.view.get(&args.id).cloned() else {
        return Err(fail(output, &EngineError::NotFound(args.id.clone())));
    };
    let caps = host.view.capabilities(&args.id);

    if output.is_json() {
        let caps_json = caps.map(|c| {
            serde_json::json!({ "view": c.view, "edit": c.edit, "delete": c.delete })
        });
        render_json(&serde_json::json!({ "item": item, "capabilities": caps_json }))?;
        return Ok(());
    }

    let mut out = io::stdout().lock();
    writeln!(out, "{}", item.name)?;
    pretty_rule(&mut out)?;
    pretty_kv(&mut out, "id", &item.id)?;
    pretty_kv(&mut out, "rating", item.rating.to_string())?;
    pretty_kv(&mut out, "price", item.price_level.to_string())?;
    if let Some(address) = &item.address {
        pretty_kv(&mut out, "address", address)?;
    }
    pretty_kv(
        &mut out,
        "category",
        item.category.map_or("-", Category::as_str),
    )?;
    if !item.tags.is_empty() {
        let tags: Vec<&str> = item.tags.iter().map(String::as_str).collect();
        pretty_kv(&mut out, "tags", tags.join(", "))?;
    }
    if !item.notes.is_empty() {
        pretty_kv(&mut out, "notes", &item.notes)?;
    }
    pretty_kv(
        &mut out,
        "cold brew",
        if item.supports_cold_brew { "yes" } else { "no" },
    )?;
    if let Some(coordinates) = item.coordinates {
        pretty_kv(&mut out, "location", coordinates.to_string())?;
    }
    pretty_kv(&mut out, "owner", &item.owner_id)?;
    pretty_kv(
        &mut out,
        "added",
        item.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
    )?;

    if let Some(caps) = caps {
        let granted: Vec<&str> = describe_capabilities(caps)
            .iter()
            .filter(|s| s.granted)
            .map(|s| s.name)
            .collect();
        pretty_kv(&mut out, "you may", granted.join(", "))?;
    }
    Ok(())
}
