//! `cup rm` — delete a shop.

use clap::Args;

use crate::cmd::{Host, fail};
use crate::output::{OutputMode, render_success};

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Item id.
    pub id: String,
}

pub fn run_rm(args: &RmArgs, host: &mut Host, output: OutputMode) -> anyhow::Result<()> {
    if let Err(err) = host.view.remove(&args.id) {
        return Err(fail(output, &err));
    }
    render_success(output, &format!("Removed {}", args.id))?;
    Ok(())
}
