pub mod config;
pub mod reviews;
pub mod serve;

use school_reviews::OutputFormat;
use serde::Serialize;

/// Print a serializable value in a JSON output format
pub(crate) fn print_json<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let out = match format {
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
        _ => serde_json::to_string(value)?,
    };
    println!("{}", out);
    Ok(())
}
