//! One-shot catalog listing

use anyhow::Result;
use clap::Args;
use coursectl_core::{CourseConfig, PaginatedSearchList, Transition};
use tracing::{info, instrument};

use super::{catalog, TypeFilter};
use crate::render::{write_listing, OutputFormat};
use crate::ui;

#[derive(Args, Debug)]
pub struct BrowseArgs {
    /// Search term (lists the whole catalog by name when omitted)
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    #[command(flatten)]
    pub types: TypeFilter,

    /// Number of pages to load
    #[arg(long, short = 'p', default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// Output format (text, json)
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[instrument(skip_all, fields(query = ?args.query, pages = args.pages))]
pub async fn run_browse(args: BrowseArgs, config: &CourseConfig) -> Result<()> {
    let list = PaginatedSearchList::new(catalog(config)?);
    let query = args.types.query(args.query.as_deref().unwrap_or_default());

    let pb = ui::spinner("Loading catalog...");
    let mut outcome = list.set_query(query).await;
    let mut loaded = 1;

    while outcome == Transition::Applied && loaded < args.pages && list.snapshot().has_more {
        loaded += 1;
        ui::set_message(&pb, format!("Loading page {}...", loaded));
        outcome = list.load_more().await;
    }

    let state = list.snapshot();
    match state.error {
        Some(ref err) => ui::finish_error(pb, err.to_string()),
        None => ui::finish_success(pb, format!("{} learning objects", state.items.len())),
    }
    info!(
        items = state.items.len(),
        pages = loaded,
        has_more = state.has_more,
        "Browse complete"
    );

    write_listing(&mut std::io::stdout().lock(), &state, args.format)?;

    if let Some(err) = state.error {
        anyhow::bail!("{}", err);
    }
    Ok(())
}
