//! `cup add` — catalog a new shop.

use clap::Args;
use cuppa_core::model::draft::parse_tags;
use cuppa_core::{Category, Coordinates, EngineError, ItemDraft, PriceLevel, Rating};

use crate::cmd::{Host, fail};
use crate::output::{OutputMode, render_json, render_success};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Shop name.
    pub name: String,

    /// Street address or neighborhood description.
    #[arg(short, long)]
    pub address: Option<String>,

    /// Rating, 0 to 5 in half-point steps.
    #[arg(short, long, default_value_t = 0.0)]
    pub rating: f64,

    /// Price level, 1 to 4.
    #[arg(short, long, default_value_t = 1)]
    pub price: u8,

    /// Neighborhood category (e.g. rino, capitol-hill).
    #[arg(short, long)]
    pub category: Option<String>,

    /// Comma-separated tags.
    #[arg(short, long)]
    pub tags: Option<String>,

    /// Free-form notes.
    #[arg(short, long)]
    pub notes: Option<String>,

    /// The shop serves cold brew.
    #[arg(long)]
    pub cold_brew: bool,

    /// Latitude (requires --lng).
    #[arg(long, requires = "lng")]
    pub lat: Option<f64>,

    /// Longitude (requires --lat).
    #[arg(long, requires = "lat")]
    pub lng: Option<f64>,
}

/// Build a validated draft from the CLI arguments.
pub fn draft_from_args(args: &AddArgs) -> Result<ItemDraft, EngineError> {
    let mut draft = ItemDraft::new(args.name.clone());
    draft.address = args.address.clone();
    draft.rating = Rating::from_value(args.rating)?;
    draft.price_level = PriceLevel::new(args.price)?;
    draft.category = args
        .category
        .as_deref()
        .map(str::parse::<Category>)
        .transpose()
        .map_err(|e| EngineError::Validation(e.to_string()))?;
    if let Some(tags) = &args.tags {
        draft.tags = parse_tags(tags);
    }
    if let Some(notes) = &args.notes {
        draft.notes.clone_from(notes);
    }
    draft.supports_cold_brew = args.cold_brew;
    if let (Some(lat), Some(lng)) = (args.lat, args.lng) {
        draft.coordinates = Some(Coordinates::new(lat, lng)?);
    }
    Ok(draft)
}

pub fn run_add(args: &AddArgs, host: &mut Host, output: OutputMode) -> anyhow::Result<()> {
    let draft = match draft_from_args(args) {
        Ok(draft) => draft,
        Err(err) => return Err(fail(output, &err)),
    };
    let created = match host.view.create(&draft) {
        Ok(item) => item,
        Err(err) => return Err(fail(output, &err)),
    };

    if output.is_json() {
        render_json(&created)?;
    } else {
        render_success(
            output,
            &format!("Added {} ({}) to the {} list", created.name, created.id, host.scope),
        )?;
    }
    Ok(())
}
