use crate::error::{Error, Result};
use crate::model::{Item, Series, Slice};
use chrono::DateTime;
use serde::Deserialize;
use std::path::Path;

/// Prefix the extractor writes in front of the JSON array.
const SCRIPT_PREFIX: &str = "const dataJson";

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    domain: String,
    #[serde(default)]
    package: String,
    #[serde(default)]
    path: String,
    #[serde(rename = "fileCount", default)]
    file_count: Option<f64>,
    #[serde(default)]
    size: Option<f64>,
    when: String,
}

pub fn load_series(path: &Path) -> Result<Series> {
    let text = std::fs::read_to_string(path)?;
    let series = parse_series(&text)?;
    tracing::info!(
        path = %path.display(),
        slices = series.len(),
        "loaded series"
    );
    Ok(series)
}

/// Parses a JSON array of slices, with or without the `const dataJson = `
/// script wrapper.
pub fn parse_series(text: &str) -> Result<Series> {
    let raw: Vec<Vec<RawRecord>> = serde_json::from_str(strip_script(text))?;
    let slices = raw
        .into_iter()
        .enumerate()
        .map(|(si, records)| {
            records
                .into_iter()
                .enumerate()
                .map(|(ri, record)| to_item(si, ri, record))
                .collect::<Result<Slice>>()
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Series::new(slices))
}

fn strip_script(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix(SCRIPT_PREFIX) {
        body = rest.trim_start();
        body = body.strip_prefix('=').unwrap_or(body);
    }
    body.trim().trim_end_matches(';').trim_end()
}

fn to_item(slice: usize, record: usize, raw: RawRecord) -> Result<Item> {
    let package = if raw.package.is_empty() { raw.path } else { raw.package };
    if package.is_empty() {
        return Err(Error::Source(format!(
            "slice {slice} record {record}: neither package nor path is set"
        )));
    }
    let when = DateTime::parse_from_rfc3339(&raw.when).map_err(|e| {
        Error::Source(format!(
            "slice {slice} record {record}: invalid timestamp {:?}: {e}",
            raw.when
        ))
    })?;
    Ok(Item {
        domain: raw.domain,
        package,
        file_count: raw.file_count,
        size: raw.size,
        when,
    })
}
