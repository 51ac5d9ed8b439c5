use crate::error::{GitsumError, Result};
use serde::Serialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub student_id: String,
    pub repo_ref: String,
}

pub fn load_roster(path: &Path, student_column: &str, repo_column: &str) -> Result<Vec<RosterEntry>> {
    let file = std::fs::File::open(path)
        .map_err(|e| GitsumError::Roster(format!("Cannot open {}: {e}", path.display())))?;
    read_roster(file, student_column, repo_column)
}

/// Read roster rows, locating the two columns by header name.
///
/// Rows without a student identifier are dropped.
pub fn read_roster<R: Read>(
    reader: R,
    student_column: &str,
    repo_column: &str,
) -> Result<Vec<RosterEntry>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers()?.clone();

    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| GitsumError::Roster(format!("Missing column '{name}'")))
    };
    let student_idx = position(student_column)?;
    let repo_idx = position(repo_column)?;

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record?;
        let student_id = record.get(student_idx).unwrap_or("").trim();
        if student_id.is_empty() {
            continue;
        }
        entries.push(RosterEntry {
            student_id: student_id.to_string(),
            repo_ref: record.get(repo_idx).unwrap_or("").trim().to_string(),
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_named_columns_in_any_order() {
        let csv = "\
Name,Link,Student ID
Ada,https://github.com/ada/a2 ,1001
Bo,git@github.com:bo/a2.git,1002
,,
";
        let entries = read_roster(csv.as_bytes(), "Student ID", "Link").unwrap();
        assert_eq!(
            entries,
            vec![
                RosterEntry {
                    student_id: "1001".into(),
                    repo_ref: "https://github.com/ada/a2".into(),
                },
                RosterEntry {
                    student_id: "1002".into(),
                    repo_ref: "git@github.com:bo/a2.git".into(),
                },
            ]
        );
    }

    #[test]
    fn missing_column_is_reported() {
        let csv = "ID,Link\n1,x\n";
        match read_roster(csv.as_bytes(), "Student ID", "Link") {
            Err(GitsumError::Roster(msg)) => assert!(msg.contains("Student ID")),
            other => panic!("expected roster error, got {other:?}"),
        }
    }

    #[test]
    fn short_rows_have_empty_references() {
        let csv = "Student ID,Link\n1003\n";
        let entries = read_roster(csv.as_bytes(), "Student ID", "Link").unwrap();
        assert_eq!(entries[0].repo_ref, "");
    }
}
