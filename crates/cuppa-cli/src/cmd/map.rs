//! `cup map` — the geographic projection, rendered as text.

use std::io;

use clap::Args;

use crate::cmd::list::{ListArgs, SortArg, spec_from_args};
use crate::cmd::{Host, fail};
use crate::map_text::TextMapSurface;
use crate::output::{OutputMode, render_json};

#[derive(Args, Debug)]
pub struct MapArgs {
    /// Search text matched against name, address, and tags.
    #[arg(short, long)]
    pub query: Option<String>,

    /// Restrict to one neighborhood category.
    #[arg(short, long)]
    pub category: Option<String>,
}

pub fn run_map(args: &MapArgs, host: &mut Host, output: OutputMode) -> anyhow::Result<()> {
    // The map consumes the same projection the table does.
    let list_args = ListArgs {
        query: args.query.clone(),
        category: args.category.clone(),
        sort: SortArg::Created,
        asc: false,
    };
    let spec = match spec_from_args(&list_args) {
        Ok(spec) => spec,
        Err(err) => return Err(fail(output, &err)),
    };

    let mut surface = TextMapSurface::new();
    host.view.reconcile_markers(&spec, &mut surface);

    if output.is_json() {
        render_json(&surface.to_json())?;
    } else {
        let mut out = io::stdout().lock();
        surface.render(&mut out)?;
        if surface.marker_count() > 0 {
            use std::io::Write as _;
            writeln!(out, "{} marker(s)", surface.marker_count())?;
        }
    }
    Ok(())
}
