//! Command implementations for coursectl CLI
//!
//! Each submodule handles a specific command group:
//! - `browse`: one-shot catalog listing
//! - `interactive`: debounced search REPL
//! - `show`: single learning object details

pub mod browse;
pub mod interactive;
pub mod show;

pub use browse::run_browse;
pub use interactive::run_interactive;
pub use show::run_show;

use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::Args;
use coursectl_core::{CourseConfig, Query};
use coursectl_lms::{CatalogSource, LmsClient, LO_TYPES, LO_TYPES_FILTER};

/// Learning object type selection shared by the listing commands
#[derive(Args, Debug, Clone, Default)]
pub struct TypeFilter {
    /// Learning object types to include (comma-separated; default: all)
    #[arg(
        long = "type",
        short = 't',
        value_name = "TYPE",
        value_delimiter = ',',
        value_parser = PossibleValuesParser::new(LO_TYPES)
    )]
    pub types: Vec<String>,
}

impl TypeFilter {
    /// Query for `term` restricted to the selected types
    pub fn query(&self, term: &str) -> Query {
        build_query(term, &self.types)
    }
}

pub fn build_query(term: &str, types: &[String]) -> Query {
    Query::new(term).with_filter(LO_TYPES_FILTER, types.iter().cloned())
}

/// Catalog data source configured from the user's config
pub fn catalog(config: &CourseConfig) -> Result<CatalogSource> {
    if config.lms.token.is_none() {
        tracing::warn!(
            "No LMS token configured; set COURSECTL_TOKEN or lms.token in {}",
            CourseConfig::config_path().display()
        );
    }
    let client = LmsClient::new(&config.lms, config.cache.skill_capacity)?;
    Ok(CatalogSource::new(client))
}
