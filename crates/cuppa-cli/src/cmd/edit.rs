//! `cup edit` — full-form save: a field-granular patch from flags.

use clap::Args;
use cuppa_core::model::draft::parse_tags;
use cuppa_core::{Category, Coordinates, EngineError, ItemPatch, PriceLevel, Rating};

use crate::cmd::{Host, fail};
use crate::output::{OutputMode, render_success};

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Item id.
    pub id: String,

    /// New name.
    #[arg(long)]
    pub name: Option<String>,

    /// New address.
    #[arg(long, conflicts_with = "clear_address")]
    pub address: Option<String>,

    /// Remove the address.
    #[arg(long)]
    pub clear_address: bool,

    /// New rating, 0 to 5 in half-point steps.
    #[arg(long)]
    pub rating: Option<f64>,

    /// New price level, 1 to 4.
    #[arg(long)]
    pub price: Option<u8>,

    /// New neighborhood category.
    #[arg(long, conflicts_with = "clear_category")]
    pub category: Option<String>,

    /// Remove the category.
    #[arg(long)]
    pub clear_category: bool,

    /// Replace the tag set (comma-separated).
    #[arg(long)]
    pub tags: Option<String>,

    /// Replace the notes.
    #[arg(long)]
    pub notes: Option<String>,

    /// Set the cold brew flag.
    #[arg(long)]
    pub cold_brew: Option<bool>,

    /// New latitude (requires --lng).
    #[arg(long, requires = "lng", conflicts_with = "clear_coords")]
    pub lat: Option<f64>,

    /// New longitude (requires --lat).
    #[arg(long, requires = "lat", conflicts_with = "clear_coords")]
    pub lng: Option<f64>,

    /// Remove the coordinates (and the map marker with them).
    #[arg(long)]
    pub clear_coords: bool,
}

/// Build the patch from the flags.
pub fn patch_from_args(args: &EditArgs) -> Result<ItemPatch, EngineError> {
    let mut patch = ItemPatch::empty();
    patch.name = args.name.clone();
    if args.clear_address {
        patch.address = Some(None);
    } else if let Some(address) = &args.address {
        patch.address = Some(Some(address.clone()));
    }
    patch.rating = args.rating.map(Rating::from_value).transpose()?;
    patch.price_level = args.price.map(PriceLevel::new).transpose()?;
    if args.clear_category {
        patch.category = Some(None);
    } else if let Some(label) = &args.category {
        let category = label
            .parse::<Category>()
            .map_err(|e| EngineError::Validation(e.to_string()))?;
        patch.category = Some(Some(category));
    }
    patch.tags = args.tags.as_deref().map(parse_tags);
    patch.notes = args.notes.clone();
    patch.supports_cold_brew = args.cold_brew;
    if args.clear_coords {
        patch.coordinates = Some(None);
    } else if let (Some(lat), Some(lng)) = (args.lat, args.lng) {
        patch.coordinates = Some(Some(Coordinates::new(lat, lng)?));
    }
    Ok(patch)
}

pub fn run_edit(args: &EditArgs, host: &mut Host, output: OutputMode) -> anyhow::Result<()> {
    let patch = match patch_from_args(args) {
        Ok(patch) => patch,
        Err(err) => return Err(fail(output, &err)),
    };
    if patch.is_empty() {
        render_success(output, "Nothing to change")?;
        return Ok(());
    }
    if let Err(err) = host.view.update(&args.id, &patch) {
        return Err(fail(output, &err));
    }
    render_success(output, &format!("Updated {}", args.id))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use cuppa_core::model::draft::ItemField;

    use super::*;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: EditArgs,
    }

    #[test]
    fn no_flags_is_an_empty_patch() {
        let w = Wrapper::parse_from(["test", "srv-1"]);
        assert!(patch_from_args(&w.args).expect("valid").is_empty());
    }

    #[test]
    fn set_and_clear_map_to_double_options() {
        let w = Wrapper::parse_from([
            "test", "srv-1", "--address", "123 Main St", "--clear-category",
        ]);
        let patch = patch_from_args(&w.args).expect("valid");
        assert_eq!(patch.address, Some(Some("123 Main St".into())));
        assert_eq!(patch.category, Some(None));
        assert_eq!(
            patch.touched(),
            [ItemField::Address, ItemField::Category].into()
        );
    }

    #[test]
    fn off_grid_rating_rejected() {
        let w = Wrapper::parse_from(["test", "srv-1", "--rating", "1.2"]);
        assert!(matches!(
            patch_from_args(&w.args),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn coords_flags_build_a_pair() {
        let w = Wrapper::parse_from([
            "test", "srv-1", "--lat", "39.75", "--lng", "-104.99",
        ]);
        let patch = patch_from_args(&w.args).expect("valid");
        assert!(matches!(patch.coordinates, Some(Some(_))));

        let w = Wrapper::parse_from(["test", "srv-1", "--clear-coords"]);
        let patch = patch_from_args(&w.args).expect("valid");
        assert_eq!(patch.coordinates, Some(None));
    }
}
