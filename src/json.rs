//! JSON interchange: an array of `[level, title, page]` triples.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::outline::{Outline, TocEntry};
use crate::target::Target;

/// Page column as written to JSON. Ranges stay strings so they survive a round trip.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum PageValue {
    Number(i64),
    Range(String),
}

impl From<Target> for PageValue {
    fn from(target: Target) -> Self {
        match target {
            Target::Page(p) => PageValue::Number(p as i64),
            Target::Range { .. } => PageValue::Range(target.to_string()),
            Target::Unresolved => PageValue::Number(-1),
        }
    }
}

/// Serialize the outline as a JSON array of triples.
pub fn export(outline: &Outline, pretty: bool) -> Result<String> {
    let triples: Vec<(u32, &str, PageValue)> = outline
        .walk()
        .into_iter()
        .map(|(path, node)| {
            (
                path.depth() as u32,
                node.title.as_str(),
                PageValue::from(node.target),
            )
        })
        .collect();

    let json = if pretty {
        serde_json::to_string_pretty(&triples)?
    } else {
        serde_json::to_string(&triples)?
    };
    Ok(json)
}

/// Parse a JSON array of triples. Malformed items are skipped.
pub fn import(json: &str) -> Result<Outline> {
    let value: Value = serde_json::from_str(json).context("Failed to parse TOC JSON")?;
    from_value(&value)
}

/// Build an outline from already-parsed JSON.
pub fn from_value(value: &Value) -> Result<Outline> {
    let items = value
        .as_array()
        .ok_or_else(|| anyhow!("TOC JSON must be an array of [level, title, page] entries"))?;

    let mut entries = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match parse_entry(item) {
            Some(entry) => entries.push(entry),
            None => warn!(index, %item, "skipping malformed TOC entry"),
        }
    }

    Ok(Outline::from_entries(entries))
}

fn parse_entry(item: &Value) -> Option<TocEntry> {
    // Extra trailing fields (destination details some tools emit) are ignored.
    let fields = item.as_array()?;
    if fields.len() < 3 {
        return None;
    }

    let level = fields[0].as_i64()?.clamp(0, u32::MAX as i64) as u32;
    let title = fields[1].as_str()?.to_string();
    let target = parse_page(&fields[2]);

    Some(TocEntry::new(level, title, target))
}

fn parse_page(value: &Value) -> Target {
    match value {
        Value::Number(n) => match n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)) {
            Some(p) if p >= 1 => Target::Page(p.min(u32::MAX as i64) as u32),
            _ => Target::Unresolved,
        },
        Value::String(s) => Target::parse(s)
            .ok()
            .or_else(|| reversed_range_start(s))
            .unwrap_or_default(),
        _ => Target::default(),
    }
}

/// A range written end-first, like "10-5", still names its first page.
fn reversed_range_start(s: &str) -> Option<Target> {
    let (start, end) = s.split_once('-')?;
    let start: u32 = start.trim().parse().ok()?;
    let end: u32 = end.trim().parse().ok()?;
    if end == 0 || start <= end {
        return None;
    }
    warn!(page = s, "page range ends before it starts, keeping its start page");
    Some(Target::Page(start))
}

pub fn export_file<P: AsRef<Path>>(path: P, outline: &Outline, pretty: bool) -> Result<()> {
    let path = path.as_ref();
    let json = export(outline, pretty)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), entries = outline.len(), "exported TOC");
    Ok(())
}

pub fn import_file<P: AsRef<Path>>(path: P) -> Result<Outline> {
    let path = path.as_ref();
    let json =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let outline =
        import(&json).with_context(|| format!("Failed to import TOC from {}", path.display()))?;
    info!(path = %path.display(), entries = outline.len(), "imported TOC");
    Ok(outline)
}
