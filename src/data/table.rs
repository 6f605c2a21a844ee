//! CSV encoding of a [`Dataset`]
//!
//! Every field is read as text and each column is then typed as a whole:
//! integers, then floats, then booleans, falling back to text. Dates and
//! sequences are never inferred here; the repair chain restores them.

use std::collections::HashSet;
use std::io::{Read, Write};

use super::{Dataset, DatasetError, Value};

/// Reads a dataset from CSV with a header row
///
/// A header row that repeats a column name is rejected.
pub fn read_dataset<R: Read>(reader: R) -> Result<Dataset, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = header_names(&mut csv_reader)?;
    let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for result in csv_reader.records() {
        let record = result?;
        for (column, field) in raw_columns.iter_mut().zip(record.iter()) {
            column.push(field.to_string());
        }
    }

    let mut dataset = Dataset::new();
    for (name, raw) in headers.into_iter().zip(raw_columns) {
        dataset.set_column(name, infer_column(raw))?;
    }
    Ok(dataset)
}

/// Reads only the header row
pub fn read_headers<R: Read>(reader: R) -> Result<Vec<String>, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);
    header_names(&mut csv_reader)
}

fn header_names<R: Read>(csv_reader: &mut csv::Reader<R>) -> Result<Vec<String>, DatasetError> {
    let headers: Vec<String> = csv_reader.headers()?.iter().map(String::from).collect();
    let mut seen = HashSet::new();
    if let Some(duplicate) = headers.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(DatasetError::DuplicateColumn(duplicate.clone()));
    }
    Ok(headers)
}

/// Writes a dataset as CSV with a header row
pub fn write_dataset<W: Write>(dataset: &Dataset, writer: W) -> Result<(), DatasetError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(dataset.column_names())?;
    for row in 0..dataset.len() {
        let record: Vec<String> = dataset
            .columns()
            .iter()
            .map(|column| column.values[row].to_field())
            .collect();
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

/// Types a column of raw fields
fn infer_column(raw: Vec<String>) -> Vec<Value> {
    match column_kind(&raw) {
        ColumnKind::Int => raw
            .iter()
            .map(|s| s.parse::<i64>().map(Value::Int).unwrap_or(Value::Null))
            .collect(),
        ColumnKind::Float => raw
            .iter()
            .map(|s| match parse_float(s) {
                Some(f) if !f.is_nan() => Value::Float(f),
                _ => Value::Null,
            })
            .collect(),
        ColumnKind::Bool => raw
            .iter()
            .map(|s| parse_bool(s).map(Value::Bool).unwrap_or(Value::Null))
            .collect(),
        ColumnKind::Text => raw
            .into_iter()
            .map(|s| if s.is_empty() { Value::Null } else { Value::Text(s) })
            .collect(),
    }
}

fn column_kind(raw: &[String]) -> ColumnKind {
    let mut present = raw.iter().filter(|s| !s.is_empty()).peekable();
    if present.peek().is_none() {
        // All-empty columns behave like a column of NaN
        return ColumnKind::Float;
    }

    let present: Vec<&String> = present.collect();
    if present.iter().all(|s| s.parse::<i64>().is_ok()) {
        ColumnKind::Int
    } else if present.iter().all(|s| parse_float(s).is_some()) {
        ColumnKind::Float
    } else if present.iter().all(|s| parse_bool(s).is_some()) {
        ColumnKind::Bool
    } else {
        ColumnKind::Text
    }
}

fn parse_float(s: &str) -> Option<f64> {
    match s.to_ascii_lowercase().as_str() {
        "nan" => Some(f64::NAN),
        "inf" | "+inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        lower if lower.contains("inf") || lower.contains("nan") => None,
        _ => s.parse::<f64>().ok(),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "True" | "true" | "TRUE" => Some(true),
        "False" | "false" | "FALSE" => Some(false),
        _ => None,
    }
}
