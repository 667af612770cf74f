//! `cup rate` — in-place rating quick edit.

use clap::Args;
use cuppa_core::QuickEdit;

use crate::cmd::{Host, fail};
use crate::output::{OutputMode, render_success};

#[derive(Args, Debug)]
pub struct RateArgs {
    /// Item id.
    pub id: String,

    /// New rating, 0 to 5 in half-point steps.
    pub rating: f64,
}

pub fn run_rate(args: &RateArgs, host: &mut Host, output: OutputMode) -> anyhow::Result<()> {
    if let Err(err) = host.view.quick_update(&args.id, QuickEdit::Rating(args.rating)) {
        return Err(fail(output, &err));
    }
    render_success(output, &format!("Rated {} at {}", args.id, args.rating))?;
    Ok(())
}
