//! Decoding of raw testing rows into [`TestRecord`]s.
//!
//! The public dataset is served as a JSON array of objects where counts
//! are strings and dates are floating timestamps, e.g.
//! `{"date": "2020-03-01T00:00:00.000", "total_results_reported": "12"}`.

use super::SourceError;
use crate::models::{Outcome, TestRecord};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

/// A row as it appears on the wire. Every field is optional so a missing
/// one can be reported by name instead of as a generic decode error.
#[derive(Debug, Deserialize)]
struct RawRecord {
    date: Option<String>,
    state_name: Option<String>,
    overall_outcome: Option<String>,
    total_results_reported: Option<Value>,
    new_results_reported: Option<Value>,
}

/// Decode a JSON payload into test records.
///
/// The payload must be an array; each element is decoded on its own so a
/// bad row is reported by index.
pub fn parse_records(payload: &[u8]) -> Result<Vec<TestRecord>, SourceError> {
    let rows: Vec<Value> = serde_json::from_slice(payload)?;

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            convert(row).map_err(|reason| SourceError::MalformedRecord { index, reason })
        })
        .collect()
}

fn convert(row: Value) -> Result<TestRecord, String> {
    let raw: RawRecord = serde_json::from_value(row).map_err(|e| e.to_string())?;

    let date = raw.date.ok_or("missing field 'date'")?;
    let state_name = raw.state_name.ok_or("missing field 'state_name'")?;
    let outcome = raw
        .overall_outcome
        .ok_or("missing field 'overall_outcome'")?;

    Ok(TestRecord {
        report_date: parse_date(&date)?,
        state_name,
        overall_outcome: Outcome::from(outcome.as_str()),
        total_results_reported: parse_count(
            "total_results_reported",
            raw.total_results_reported.as_ref(),
        )?,
        new_results_reported: parse_count(
            "new_results_reported",
            raw.new_results_reported.as_ref(),
        )?,
    })
}

/// Parse `YYYY-MM-DD`, ignoring any time component that follows.
fn parse_date(value: &str) -> Result<NaiveDate, String> {
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}': {}", value, e))
}

/// Accept a non-negative integer given either as a JSON number or string.
fn parse_count(field: &str, value: Option<&Value>) -> Result<u64, String> {
    match value {
        None | Some(Value::Null) => Err(format!("missing field '{}'", field)),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| format!("'{}' is not a non-negative integer: {}", field, n)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("'{}' is not a non-negative integer: '{}'", field, s)),
        Some(other) => Err(format!("'{}' has unexpected type: {}", field, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_socrata_row() {
        let payload = br#"[{
            "state": "CA",
            "state_name": "California",
            "state_fips": "06",
            "fema_region": "Region 9",
            "overall_outcome": "Positive",
            "date": "2020-03-01T00:00:00.000",
            "new_results_reported": "12",
            "total_results_reported": "40"
        }]"#;

        let records = parse_records(payload).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0],
            TestRecord {
                report_date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
                state_name: "California".to_string(),
                overall_outcome: Outcome::Positive,
                total_results_reported: 40,
                new_results_reported: 12,
            }
        );
    }

    #[test]
    fn test_parse_numeric_counts_and_plain_date() {
        let payload = br#"[{"date": "2021-01-02", "state_name": "Texas",
            "overall_outcome": "Inconclusive",
            "new_results_reported": 0, "total_results_reported": 7}]"#;

        let records = parse_records(payload).unwrap();

        assert_eq!(records[0].total_results_reported, 7);
        assert_eq!(records[0].new_results_reported, 0);
        assert_eq!(records[0].overall_outcome, Outcome::Inconclusive);
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_records(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_missing_field_names_row() {
        let payload = br#"[
            {"date": "2021-01-02", "state_name": "Texas", "overall_outcome": "Negative",
             "new_results_reported": "1", "total_results_reported": "1"},
            {"date": "2021-01-02", "state_name": "Texas", "overall_outcome": "Negative",
             "new_results_reported": "1"}
        ]"#;

        match parse_records(payload) {
            Err(SourceError::MalformedRecord { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("total_results_reported"));
            }
            other => panic!("expected malformed record, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_numeric_count() {
        let payload = br#"[{"date": "2021-01-02", "state_name": "Ohio",
            "overall_outcome": "Negative",
            "new_results_reported": "lots", "total_results_reported": "3"}]"#;

        let err = parse_records(payload).unwrap_err();
        assert!(err.to_string().contains("new_results_reported"));
    }

    #[test]
    fn test_rejects_negative_count() {
        let payload = br#"[{"date": "2021-01-02", "state_name": "Ohio",
            "overall_outcome": "Negative",
            "new_results_reported": -4, "total_results_reported": "3"}]"#;

        assert!(matches!(
            parse_records(payload),
            Err(SourceError::MalformedRecord { index: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_bad_date() {
        let bad_date = br#"[{"date": "03/01/2020", "state_name": "Ohio",
            "overall_outcome": "Negative",
            "new_results_reported": "1", "total_results_reported": "3"}]"#;

        assert!(parse_records(bad_date).unwrap_err().to_string().contains("invalid date"));
    }

    #[test]
    fn test_unrecognized_outcome_is_kept_as_other() {
        let payload = br#"[{"date": "2020-03-01", "state_name": "Ohio",
            "overall_outcome": "Pending",
            "new_results_reported": "1", "total_results_reported": "3"}]"#;

        let records = parse_records(payload).unwrap();
        assert_eq!(records[0].overall_outcome, Outcome::Other);
    }

    #[test]
    fn test_wrong_field_type_names_row() {
        let payload = br#"[
            {"date": "2021-01-02", "state_name": "Texas", "overall_outcome": "Negative",
             "new_results_reported": "1", "total_results_reported": "1"},
            {"date": "2021-01-02", "state_name": 5, "overall_outcome": "Negative",
             "new_results_reported": "1", "total_results_reported": "1"}
        ]"#;

        match parse_records(payload) {
            Err(SourceError::MalformedRecord { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected malformed record, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_row_names_row() {
        assert!(matches!(
            parse_records(b"[42]"),
            Err(SourceError::MalformedRecord { index: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_non_array_payload() {
        assert!(matches!(
            parse_records(br#"{"error": true}"#),
            Err(SourceError::Decode(_))
        ));
    }
}
