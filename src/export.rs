//! CSV export of recorded results.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::CheckerError;
use crate::session::ItemResult;

const HEADER: [&str; 2] = ["Username", "Post Date"];

/// Write `Username,Post Date` followed by one row per result, in order.
pub fn write_csv<W: Write>(writer: W, results: &[ItemResult]) -> Result<(), CheckerError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;
    for result in results {
        csv.write_record([result.identifier.as_str(), result.value.as_str()])?;
    }
    csv.flush()?;
    Ok(())
}

pub fn export_to_path(path: &Path, results: &[ItemResult]) -> Result<(), CheckerError> {
    let file = std::fs::File::create(path)?;
    write_csv(file, results)
}

pub fn default_export_path(date: NaiveDate) -> PathBuf {
    PathBuf::from(format!("results_{}.csv", date.format("%Y-%m-%d")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(results: &[ItemResult]) -> String {
        let mut buf = Vec::new();
        write_csv(&mut buf, results).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn header_then_rows_in_order() {
        let out = render(&[
            ItemResult::success("alice", "2024-01-05"),
            ItemResult::success("bob", "No posts found"),
            ItemResult::failure("carol", "Error: User not found"),
        ]);
        assert_eq!(
            out,
            "Username,Post Date\nalice,2024-01-05\nbob,No posts found\ncarol,Error: User not found\n"
        );
    }

    #[test]
    fn values_with_commas_are_quoted() {
        let out = render(&[ItemResult::failure(
            "dave",
            "Error: Network failure after 3 attempts (timed out, retry later)",
        )]);
        assert!(out.contains(
            "dave,\"Error: Network failure after 3 attempts (timed out, retry later)\""
        ));
    }

    #[test]
    fn empty_results_still_have_header() {
        assert_eq!(render(&[]), "Username,Post Date\n");
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        export_to_path(&path, &[ItemResult::success("alice", "2024-01-05")]).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Username,Post Date\n"));
    }

    #[test]
    fn default_path_is_dated() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(default_export_path(date), PathBuf::from("results_2024-01-05.csv"));
    }
}
