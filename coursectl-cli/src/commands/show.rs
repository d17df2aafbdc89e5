//! Single learning object details

use anyhow::Result;
use clap::Args;
use coursectl_core::CourseConfig;
use tracing::instrument;

use super::catalog;
use crate::render::{write_overview, OutputFormat};
use crate::ui;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Learning object ID (e.g., course:1234567)
    #[arg(value_name = "ID")]
    pub id: String,

    /// Output format (text, json)
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[instrument(skip_all, fields(id = %args.id))]
pub async fn run_show(args: ShowArgs, config: &CourseConfig) -> Result<()> {
    let source = catalog(config)?;

    let pb = ui::spinner(format!("Fetching {}...", args.id));
    let detail = match source.course(&args.id).await {
        Ok(detail) => {
            ui::finish_success(pb, detail.course.name.clone());
            detail
        }
        Err(e) => {
            ui::finish_error(pb, e.to_string());
            return Err(e.into());
        }
    };

    let mut out = std::io::stdout().lock();
    match args.format {
        OutputFormat::Text => write_overview(&mut out, &detail)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &detail)?;
            std::io::Write::write_all(&mut out, b"\n")?;
        }
    }
    Ok(())
}
