//! JSON files of multipolygons in nested form.
//!
//! A file holds either a column (`[row, row, ...]`) or a single row, which is
//! treated as a constant argument.  A row is `[[[[x, y], ...], ...], ...]`:
//! polygons of rings of points, exterior ring first.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geo::MultiPolygon;
use serde::Deserialize;

use super::nested::{from_multipolygon, to_multipolygon, NestedMultiPolygon};

/// Contents of a multipolygon JSON file.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonInput {
    Column(Vec<MultiPolygon<f64>>),
    Row(MultiPolygon<f64>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Column(Vec<NestedMultiPolygon>),
    Row(NestedMultiPolygon),
}

impl JsonInput {
    /// Number of rows, `None` for a single constant row.
    pub fn rows(&self) -> Option<usize> {
        match self {
            JsonInput::Column(rows) => Some(rows.len()),
            JsonInput::Row(_) => None,
        }
    }
}

/// Parse multipolygons from JSON text.
pub fn read_from_str(text: &str) -> Result<JsonInput> {
    let document: Document = serde_json::from_str(text)
        .context("[io::json] expected a multipolygon or an array of multipolygons")?;
    decode(document)
}

/// Read multipolygons from a JSON file at `path`.
pub fn read_from_path(path: &Path) -> Result<JsonInput> {
    let file = File::open(path)
        .with_context(|| format!("[io::json] Failed to read JSON file: {}", path.display()))?;
    let document: Document = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("[io::json] {} is not a multipolygon or an array of multipolygons", path.display()))?;
    decode(document)
}

fn decode(document: Document) -> Result<JsonInput> {
    Ok(match document {
        Document::Column(rows) => JsonInput::Column(
            rows.iter().enumerate()
                .map(|(row, nested)| to_multipolygon(nested).map_err(|e| e.at_row(row)))
                .collect::<crate::error::Result<_>>()?,
        ),
        Document::Row(nested) => JsonInput::Row(to_multipolygon(&nested)?),
    })
}

/// Write a column of multipolygons as a JSON array of rows.
pub fn write_column<W: Write>(writer: W, rows: &[MultiPolygon<f64>]) -> Result<()> {
    let nested: Vec<NestedMultiPolygon> = rows.iter().map(from_multipolygon).collect();
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer(&mut writer, &nested).context("[io::json] Failed to serialize rows")?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
