//! Reading the identifier list handed to a run.

use std::path::Path;

use crate::error::CheckerError;

/// Read identifiers from `path`. `.csv` files contribute their first column,
/// anything else one identifier per line.
pub fn read_identifiers(path: &Path) -> Result<Vec<String>, CheckerError> {
    let contents = std::fs::read_to_string(path)?;
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        parse_csv(&contents)
    } else {
        Ok(parse_lines(&contents))
    }
}

pub fn parse_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_csv(contents: &str) -> Result<Vec<String>, CheckerError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(contents.as_bytes());

    let mut identifiers = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(first) = record.get(0).map(str::trim)
            && !first.is_empty()
        {
            identifiers.push(first.to_string());
        }
    }
    Ok(identifiers)
}
