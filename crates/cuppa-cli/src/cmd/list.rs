//! `cup list` — the sorted/filtered table view.

use std::io::{self, Write};

use clap::{Args, ValueEnum};
use cuppa_core::{
    Category, CategoryFilter, EngineError, Item, ProjectionSpec, SearchQuery, SortDirection,
    SortField, SortSpec,
};

use crate::cmd::{Host, fail};
use crate::output::{OutputMode, pretty_rule, render_json};

/// Sort key flag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Rating,
    Price,
    Created,
}

impl From<SortArg> for SortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Rating => Self::Rating,
            SortArg::Price => Self::PriceLevel,
            SortArg::Created => Self::CreatedAt,
        }
    }
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Search text matched against name, address, and tags.
    #[arg(short, long)]
    pub query: Option<String>,

    /// Restrict to one neighborhood category.
    #[arg(short, long)]
    pub category: Option<String>,

    /// Sort key.
    #[arg(short, long, value_enum, default_value_t = SortArg::Created)]
    pub sort: SortArg,

    /// Sort ascending (default is descending).
    #[arg(long)]
    pub asc: bool,
}

/// Build the projection spec from the flags.
pub fn spec_from_args(args: &ListArgs) -> Result<ProjectionSpec, EngineError> {
    let category = match &args.category {
        None => CategoryFilter::All,
        Some(label) => CategoryFilter::Only(
            label
                .parse::<Category>()
                .map_err(|e| EngineError::Validation(e.to_string()))?,
        ),
    };
    Ok(ProjectionSpec {
        query: args.query.as_deref().map(SearchQuery::new).unwrap_or_default(),
        category,
        sort: SortSpec {
            field: args.sort.into(),
            direction: if args.asc {
                SortDirection::Ascending
            } else {
                SortDirection::Descending
            },
        },
    })
}

fn write_table(w: &mut dyn Write, items: &[Item]) -> io::Result<()> {
    writeln!(
        w,
        "{:<8} {:<26} {:>6} {:<6} {:<14} TAGS",
        "ID", "NAME", "RATING", "PRICE", "CATEGORY"
    )?;
    pretty_rule(w)?;
    for item in items {
        let tags: Vec<&str> = item.tags.iter().map(String::as_str).collect();
        writeln!(
            w,
            "{:<8} {:<26} {:>6} {:<6} {:<14} {}",
            item.id,
            truncate(&item.name, 26),
            item.rating.to_string(),
            item.price_level.to_string(),
            item.category.map_or("-", Category::as_str),
            tags.join(","),
        )?;
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

pub fn run_list(args: &ListArgs, host: &mut Host, output: OutputMode) -> anyhow::Result<()> {
    let spec = match spec_from_args(args) {
        Ok(spec) => spec,
        Err(err) => return Err(fail(output, &err)),
    };
    let visible = host.view.project(&spec).to_vec();

    if output.is_json() {
        render_json(&visible)?;
        return Ok(());
    }

    let mut out = io::stdout().lock();
    if visible.is_empty() {
        writeln!(out, "No shops in the {} list yet.", host.scope)?;
        return Ok(());
    }
    write_table(&mut out, &visible)?;
    writeln!(out, "{} shop(s)", visible.len())?;
    Ok(())
}
