//! `cup price` — in-place price-level quick edit.

use clap::Args;
use cuppa_core::QuickEdit;

use crate::cmd::{Host, fail};
use crate::output::{OutputMode, render_success};

#[derive(Args, Debug)]
pub struct PriceArgs {
    /// Item id.
    pub id: String,

    /// New price level, 1 to 4.
    pub level: u8,
}

pub fn run_price(args: &PriceArgs, host: &mut Host, output: OutputMode) -> anyhow::Result<()> {
    if let Err(err) = host
        .view
        .quick_update(&args.id, QuickEdit::PriceLevel(args.level))
    {
        return Err(fail(output, &err));
    }
    render_success(
        output,
        &format!("Set {} to price level {}", args.id, args.level),
    )?;
    Ok(())
}
