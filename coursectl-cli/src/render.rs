//! Terminal rendering of catalog cards and listing state

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use coursectl_core::ListState;
use coursectl_lms::{Course, CourseDetail, Module};
use serde::Serialize;

/// Format label when the learning object has none
const DEFAULT_FORMAT: &str = "Self Paced";

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable cards
    #[default]
    Text,
    /// JSON for machine consumption
    Json,
}

/// Human duration: `Self-paced` for 0, otherwise `Xh Ym` or `Ym`
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "Self-paced".to_string();
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

fn icon(course: &Course) -> &'static str {
    match (course.lo_format.as_deref(), course.lo_type.as_str()) {
        (Some("Self Paced"), _) => "📚",
        (Some("Virtual Classroom"), _) => "🎓",
        (_, "certification") => "🏆",
        (_, "learningProgram") => "📋",
        (_, "jobAid") => "🔧",
        _ => "📖",
    }
}

fn skills_text(course: &Course) -> String {
    if course.skills.is_empty() {
        "General".to_string()
    } else {
        course.skills.join(", ")
    }
}

/// One catalog card as display lines
pub fn card_lines(course: &Course) -> Vec<String> {
    vec![
        format!(
            "{} {}  [{}]",
            icon(course),
            course.name,
            course.lo_format.as_deref().unwrap_or(DEFAULT_FORMAT)
        ),
        format!(
            "   {} · {} · Skills: {}",
            course.lo_type,
            format_duration(course.duration_secs),
            skills_text(course)
        ),
        format!("   {}", course.overview_path()),
    ]
}

/// Trailing status line: loading, error, or whether more pages exist
pub fn status_line<T>(state: &ListState<T>) -> String {
    if state.is_loading {
        return "Loading...".to_string();
    }
    if let Some(ref err) = state.error {
        return format!("✗ {}", err);
    }
    match (state.items.len(), state.has_more) {
        (0, _) => "No learning objects found.".to_string(),
        (n, true) => format!("{} shown, more available", n),
        (n, false) => format!("{} shown, end of results", n),
    }
}

/// Render a listing in text form
pub fn write_text(out: &mut impl Write, state: &ListState<Course>) -> Result<()> {
    if let Some(term) = state.query.term() {
        writeln!(out, "## Results for \"{}\"\n", term)?;
    }
    for course in &state.items {
        for line in card_lines(course) {
            writeln!(out, "{}", line)?;
        }
        writeln!(out)?;
    }
    writeln!(out, "{}", status_line(state))?;
    Ok(())
}

#[derive(Serialize)]
struct ListingJson<'a> {
    query: &'a str,
    filters: &'a std::collections::BTreeMap<String, Vec<String>>,
    items: &'a [Course],
    has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn write_json(out: &mut impl Write, state: &ListState<Course>) -> Result<()> {
    let json = ListingJson {
        query: &state.query.search_term,
        filters: &state.query.filters,
        items: &state.items,
        has_more: state.has_more,
        next_cursor: state.cursor.as_ref().map(|c| c.as_str()),
        error: state.error.as_ref().map(|e| e.to_string()),
    };
    serde_json::to_writer_pretty(&mut *out, &json)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_listing(
    out: &mut impl Write,
    state: &ListState<Course>,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => write_text(out, state),
        OutputFormat::Json => write_json(out, state),
    }
}

fn module_line(module: &Module) -> String {
    let mut line = format!(
        "- {} · {}",
        module.name,
        module.format.as_deref().unwrap_or(DEFAULT_FORMAT)
    );
    if let Some(ref content_type) = module.content_type {
        line.push_str(&format!(" · {}", content_type));
    }
    line.push_str(&format!(" · {}", format_duration(module.duration_secs)));
    line
}

/// Detailed view of a single learning object
pub fn write_overview(out: &mut impl Write, detail: &CourseDetail) -> Result<()> {
    let course = &detail.course;
    writeln!(out, "# {}\n", course.name)?;
    writeln!(out, "ID:       {}", course.id)?;
    writeln!(out, "Type:     {}", course.lo_type)?;
    writeln!(
        out,
        "Format:   {}",
        course.lo_format.as_deref().unwrap_or(DEFAULT_FORMAT)
    )?;
    writeln!(out, "Duration: {}", format_duration(course.duration_secs))?;
    writeln!(out, "Skills:   {}", skills_text(course))?;
    if !course.tags.is_empty() {
        writeln!(out, "Tags:     {}", course.tags.join(", "))?;
    }
    if let Some(ref instance) = course.instance_id {
        writeln!(out, "Instance: {}", instance)?;
    }
    writeln!(out, "Link:     {}", course.overview_path())?;
    writeln!(out, "Enrolled: {}", if detail.enrolled { "yes" } else { "no" })?;

    if let Some(ref description) = course.description {
        writeln!(out, "\n{}", description)?;
    }
    if let Some(ref overview) = course.overview {
        writeln!(out, "\n## Overview\n\n{}", overview)?;
    }

    writeln!(out, "\n## Modules\n")?;
    if detail.modules.is_empty() {
        writeln!(out, "No modules available")?;
    }
    for module in &detail.modules {
        writeln!(out, "{}", module_line(module))?;
    }
    Ok(())
}
