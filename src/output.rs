//! Output formatting for review listings
//!
//! This module provides the output formats used by the command line, and the
//! rendering of review lists into each of them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::review::Review;

/// Default maximum length for comment display in tables
pub const DEFAULT_COMMENT_MAX_LEN: usize = 60;

/// Unified output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Pretty table with borders (default)
    #[default]
    Table,
    /// Markdown table format
    Markdown,
    /// Compact JSON (single line per object)
    Json,
    /// Pretty-printed JSON with indentation
    JsonPretty,
    /// JSON Lines format (one JSON object per line, for streaming)
    JsonLine,
    /// Pipe-separated values with header
    Psv,
}

impl OutputFormat {
    /// Check if this is a JSON variant
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json | Self::JsonPretty | Self::JsonLine)
    }

    /// Get a list of all format names for help text
    pub fn all_names() -> &'static [&'static str] {
        &[
            "table",
            "markdown",
            "json",
            "json-pretty",
            "json-line",
            "psv",
        ]
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
            Self::JsonPretty => write!(f, "json-pretty"),
            Self::JsonLine => write!(f, "json-line"),
            Self::Psv => write!(f, "psv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "pretty" => Ok(Self::Table),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "json-pretty" | "jsonpretty" => Ok(Self::JsonPretty),
            "json-line" | "jsonline" | "jsonl" | "ndjson" => Ok(Self::JsonLine),
            "psv" | "pipe" => Ok(Self::Psv),
            _ => Err(format!(
                "Unknown output format '{}'. Valid formats: {}",
                s,
                Self::all_names().join(", ")
            )),
        }
    }
}

/// Render reviews in the given format.
///
/// JSON variants produce the same `{"reviews": [...], "count": n}` document as
/// the HTTP feed; `json-line` emits one review object per line instead.
pub fn format_reviews(reviews: &[Review], format: OutputFormat) -> anyhow::Result<String> {
    let feed = serde_json::json!({ "reviews": reviews, "count": reviews.len() });

    let out = match format {
        OutputFormat::Json => serde_json::to_string(&feed)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&feed)?,
        OutputFormat::JsonLine => reviews
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?
            .join("\n"),
        OutputFormat::Psv => format_psv(reviews),
        #[cfg(feature = "display")]
        OutputFormat::Table | OutputFormat::Markdown => format_table(reviews, format),
        #[cfg(not(feature = "display"))]
        OutputFormat::Table | OutputFormat::Markdown => format_psv(reviews),
    };
    Ok(out)
}

fn format_psv(reviews: &[Review]) -> String {
    let mut lines = vec!["id|school_name|reviewer_name|rating|comment|created_at".to_string()];
    lines.extend(reviews.iter().map(|r| {
        format!(
            "{}|{}|{}|{}|{}|{}",
            r.id,
            r.school_name,
            r.reviewer_name,
            r.rating,
            r.comment.replace(['\n', '|'], " "),
            r.created_at
        )
    }));
    lines.join("\n")
}

#[cfg(feature = "display")]
fn format_table(reviews: &[Review], format: OutputFormat) -> String {
    use tabled::settings::Style;
    use tabled::{Table, Tabled};

    #[derive(Tabled)]
    struct ReviewRow {
        id: i64,
        school: String,
        reviewer: String,
        rating: String,
        comment: String,
        date: String,
    }

    let rows = reviews.iter().map(|r| {
        let display = r.display();
        ReviewRow {
            id: r.id,
            school: r.school_name.clone(),
            reviewer: r.reviewer_name.clone(),
            rating: display.stars(),
            comment: truncate_name(&r.comment.replace('\n', " "), DEFAULT_COMMENT_MAX_LEN),
            date: display.date(),
        }
    });

    let mut table = Table::new(rows);
    match format {
        OutputFormat::Markdown => table.with(Style::markdown()),
        _ => table.with(Style::rounded()),
    };
    table.to_string()
}

/// Truncate a string to the specified length, adding "..." if truncated
///
/// # Examples
///
/// ```
/// use school_reviews::output::truncate_name;
///
/// assert_eq!(truncate_name("Short", 20), "Short");
/// assert_eq!(truncate_name("This is a very long name", 20), "This is a very lo...");
/// ```
pub fn truncate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        name.to_string()
    } else {
        let truncated: String = name.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
