//! Domain model: items, drafts, and field-granular patches.

pub mod draft;
pub mod item;

pub use draft::{ItemDraft, ItemField, ItemPatch, parse_tags};
pub use item::{Category, Coordinates, Item, PriceLevel, Rating};
