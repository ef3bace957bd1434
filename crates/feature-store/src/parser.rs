//! Parser for feature table files.
//!
//! Feature tables are exported as comma separated files:
//! - the first non-blank line is the header
//! - fields may be wrapped in double quotes, `""` inside quotes is a literal quote
//! - empty cells are missing values
//!
//! Every row must have as many fields as the header.

use crate::error::{FeatureStoreError, Result};
use crate::types::{FeatureTable, FeatureValue};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::debug;

/// Read a table file into a string
///
/// Invalid UTF-8 is replaced rather than rejected; spreadsheet exports
/// occasionally carry stray Latin-1 bytes in free-text columns.
fn read_table_file(table: &str, path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => FeatureStoreError::FileNotFound {
            table: table.to_string(),
            path: path.display().to_string(),
        },
        _ => FeatureStoreError::Io {
            table: table.to_string(),
            source: e,
        },
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|source| FeatureStoreError::Io {
            table: table.to_string(),
            source,
        })?;

    let content = String::from_utf8_lossy(&bytes);
    // Strip a UTF-8 byte order mark left by spreadsheet tools
    Ok(content.trim_start_matches('\u{feff}').to_string())
}

/// Split one record into its fields, honouring double quotes
fn split_record(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            ('"', false) if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            (',', false) => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err("Unterminated quoted field".to_string());
    }
    fields.push(field);
    Ok(fields)
}

/// Parse a feature table from text
///
/// The join key is assigned from the header when the table is registered.
pub fn parse_table_str(table: &str, content: &str) -> Result<FeatureTable> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty());

    let (header_line, header) = lines.next().ok_or_else(|| FeatureStoreError::EmptyTable {
        table: table.to_string(),
    })?;
    let columns: Vec<String> = split_record(header)
        .map_err(|reason| FeatureStoreError::ParseError {
            table: table.to_string(),
            line: header_line,
            reason,
        })?
        .into_iter()
        .map(|c| c.trim().to_string())
        .collect();

    if let Some(blank) = columns.iter().position(|c| c.is_empty()) {
        return Err(FeatureStoreError::ParseError {
            table: table.to_string(),
            line: header_line,
            reason: format!("Header column {} has no name", blank + 1),
        });
    }

    let mut rows = Vec::new();
    for (line_no, line) in lines {
        let fields = split_record(line).map_err(|reason| FeatureStoreError::ParseError {
            table: table.to_string(),
            line: line_no,
            reason,
        })?;

        if fields.len() != columns.len() {
            return Err(FeatureStoreError::FieldCountMismatch {
                table: table.to_string(),
                expected: columns.len(),
                found: fields.len(),
                line: line_no,
            });
        }

        rows.push(fields.iter().map(|f| FeatureValue::parse(f)).collect());
    }

    let parsed = FeatureTable::new(table, columns, rows);
    debug!(
        "Parsed feature table {} ({} rows, join key: {:?})",
        table,
        parsed.row_count(),
        parsed.join_key()
    );
    Ok(parsed)
}

/// Parse a feature table file
pub fn parse_table(table: &str, path: &Path) -> Result<FeatureTable> {
    let content = read_table_file(table, path)?;
    parse_table_str(table, &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JoinKey;

    #[test]
    fn test_split_record_quotes() {
        let fields = split_record(r#"1,"Masala, Dosa","say ""hi""",,x"#).unwrap();
        assert_eq!(fields, vec!["1", "Masala, Dosa", r#"say "hi""#, "", "x"]);
        assert!(split_record(r#"1,"open"#).is_err());
    }

    #[test]
    fn test_parse_table_detects_key_and_values() {
        let table = parse_table_str(
            "customer_features",
            "customer_id,age,total_orders,favourite_dish\n12345,29,14,Idli\n\n777,41,,Naan\n",
        )
        .unwrap();

        // customer_id beats age when both are present
        assert_eq!(table.join_key(), Some(JoinKey::CustomerId));
        assert_eq!(table.row_count(), 2);

        let row = table.lookup("777").unwrap();
        assert_eq!(
            row,
            vec![
                ("age", &FeatureValue::Number(41.0)),
                ("favourite_dish", &FeatureValue::Text("Naan".to_string())),
            ]
        );
    }

    #[test]
    fn test_parse_table_field_count_mismatch() {
        let err = parse_table_str("age_features", "age,avg_spend\n29,10.5,extra\n").unwrap_err();
        assert!(matches!(
            err,
            FeatureStoreError::FieldCountMismatch {
                expected: 2,
                found: 3,
                line: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_empty_table() {
        let err = parse_table_str("loyalty_features", "\n  \n").unwrap_err();
        assert!(matches!(err, FeatureStoreError::EmptyTable { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = parse_table("stayed_features", Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, FeatureStoreError::FileNotFound { .. }));
        assert_eq!(err.table(), "stayed_features");
    }
}
