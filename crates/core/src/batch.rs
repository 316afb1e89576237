//! Delimited-text batch parsing and rendering.
//!
//! The format is a header line followed by data lines, each split on a bare comma. Quoted fields,
//! escaped delimiters, and embedded newlines are **not** supported: a cell containing a comma
//! shifts the column count and the row is skipped.
//!
//! Failure policy:
//! - structural problems (no data line, missing canonical header) abort the whole batch
//! - a row whose column count differs from the header's is skipped and logged; the batch goes on

use crate::command::FieldPath;
use crate::constants::{CANONICAL_HEADERS, FIELD_DELIMITER};
use crate::record::{PatientDataInput, PatientRecord};
use crate::{CoreError, CoreResult};
use readmit_ids::RecordIdGenerator;
use serde::Serialize;
use std::collections::HashSet;

/// A data line dropped because its column count did not match the header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    /// 1-based line number in the trimmed input; the header is line 1.
    pub line: usize,
    pub expected_columns: usize,
    pub actual_columns: usize,
}

/// Records extracted from a batch plus the rows that were skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub records: Vec<PatientRecord>,
    pub skipped_rows: Vec<SkippedRow>,
}

/// Column index of every canonical header, in [`CANONICAL_HEADERS`] order.
struct ColumnMap {
    indices: [usize; CANONICAL_HEADERS.len()],
}

impl ColumnMap {
    /// Builds the map, failing on the first canonical header the file lacks.
    fn from_header_line(line: &str) -> CoreResult<(Self, usize)> {
        let headers: Vec<String> = line
            .split(FIELD_DELIMITER)
            .map(|h| h.trim().to_lowercase())
            .collect();

        let mut indices = [0usize; CANONICAL_HEADERS.len()];
        for (slot, canonical) in indices.iter_mut().zip(CANONICAL_HEADERS) {
            let wanted = canonical.to_lowercase();
            match headers.iter().position(|h| *h == wanted) {
                Some(index) => *slot = index,
                None => {
                    tracing::error!(
                        "batch header '{}' missing; detected headers: {:?}",
                        canonical,
                        headers
                    );
                    return Err(CoreError::MissingHeader {
                        missing: canonical.to_string(),
                        detected: headers.join(", "),
                        required: CANONICAL_HEADERS.join(", "),
                    });
                }
            }
        }

        Ok((Self { indices }, headers.len()))
    }

    fn index_of(&self, header: &str) -> Option<usize> {
        CANONICAL_HEADERS
            .iter()
            .position(|h| *h == header)
            .and_then(|i| self.indices.get(i).copied())
    }

    /// Trimmed cell for a canonical header, or empty if the row is short.
    fn cell<'a>(&self, values: &[&'a str], header: &str) -> &'a str {
        self.index_of(header)
            .and_then(|i| values.get(i).copied())
            .map(str::trim)
            .unwrap_or("")
    }
}

/// Facade for the batch text format.
pub struct Batch;

impl Batch {
    /// Parses batch text into records, discarding the skip report.
    ///
    /// # Errors
    ///
    /// See [`Batch::parse_with_report`].
    pub fn parse(text: &str, ids: &dyn RecordIdGenerator) -> CoreResult<Vec<PatientRecord>> {
        Self::parse_with_report(text, ids).map(|report| report.records)
    }

    /// Parses batch text into records and a list of skipped rows.
    ///
    /// Rows with an empty `id` cell receive an identifier from `ids`.
    ///
    /// # Errors
    ///
    /// - `CoreError::MissingHeaderOrData` if the trimmed text has fewer than two lines.
    /// - `CoreError::MissingHeader` naming the first canonical header absent from the header line.
    pub fn parse_with_report(text: &str, ids: &dyn RecordIdGenerator) -> CoreResult<BatchReport> {
        let lines: Vec<&str> = text.trim().split('\n').collect();
        let Some((header_line, data_lines)) = lines.split_first() else {
            return Err(CoreError::MissingHeaderOrData);
        };
        if data_lines.is_empty() {
            return Err(CoreError::MissingHeaderOrData);
        }

        let (columns, header_count) = ColumnMap::from_header_line(header_line)?;

        let mut report = BatchReport::default();
        let mut seen_ids = HashSet::new();

        for (offset, line) in data_lines.iter().enumerate() {
            let row = offset + 1;
            let values: Vec<&str> = line.split(FIELD_DELIMITER).collect();

            if values.len() != header_count {
                tracing::warn!(
                    "skipping row {}: mismatched number of columns. Expected {}, got {}. Row content: {}",
                    row + 1,
                    header_count,
                    values.len(),
                    line
                );
                report.skipped_rows.push(SkippedRow {
                    line: row + 1,
                    expected_columns: header_count,
                    actual_columns: values.len(),
                });
                continue;
            }

            let mut data = PatientDataInput::default();
            for field in FieldPath::ALL {
                data.set(field, columns.cell(&values, field.key()));
            }

            let id = match columns.cell(&values, "id") {
                "" => ids.next_id(row),
                explicit => explicit.to_string(),
            };
            if !seen_ids.insert(id.clone()) {
                tracing::warn!("duplicate patient id '{}' at row {}", id, row + 1);
            }

            report.records.push(PatientRecord::new(id, data));
        }

        Ok(report)
    }

    /// Renders records as batch text with the canonical header line.
    ///
    /// Values are written unquoted; a value containing a comma will not survive a re-parse.
    pub fn render(records: &[PatientRecord]) -> String {
        let mut out = CANONICAL_HEADERS.join(",");
        out.push('\n');

        for record in records {
            let cells: Vec<&str> = CANONICAL_HEADERS
                .iter()
                .map(|header| {
                    if *header == "id" {
                        record.id()
                    } else {
                        FieldPath::ALL
                            .into_iter()
                            .find(|field| field.key() == *header)
                            .map(|field| record.data().get(field))
                            .unwrap_or("")
                    }
                })
                .collect();
            out.push_str(&cells.join(","));
            out.push('\n');
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readmit_ids::SequentialIdGenerator;

    const HEADER: &str = "id,age,gender,diagnosisCodes,previousAdmissions,lengthOfStayDays,treatmentSummary,keyLabResultsText,hasSupportSystem,housingSituation";

    fn ids() -> SequentialIdGenerator {
        SequentialIdGenerator::new("test").expect("valid prefix")
    }

    #[test]
    fn parses_single_row_verbatim() {
        let text = format!(
            "{HEADER}\nP001, 67 ,Male,E11.9,2,5,Insulin started,HbA1c 9.1%,Yes,Stable"
        );
        let records = Batch::parse(&text, &ids()).expect("parse");

        assert_eq!(records.len(), 1);
        let record = &records[0];
        let data = record.data();
        assert_eq!(record.id(), "P001");
        assert_eq!(data.demographics.age, "67");
        assert_eq!(data.demographics.gender, "Male");
        assert_eq!(data.medical_history.diagnosis_codes, "E11.9");
        assert_eq!(data.medical_history.previous_admissions, "2");
        assert_eq!(data.medical_history.length_of_stay_days, "5");
        assert_eq!(data.medical_history.treatment_summary, "Insulin started");
        assert_eq!(data.lab_results.key_lab_results_text, "HbA1c 9.1%");
        assert_eq!(data.social_determinants.has_support_system, "Yes");
        assert_eq!(data.social_determinants.housing_situation, "Stable");
    }

    #[test]
    fn header_match_is_case_insensitive_and_order_independent() {
        let text = "HOUSINGSITUATION,hassupportsystem,KeyLabResultsText,treatmentsummary,lengthofstaydays,PreviousAdmissions,diagnosiscodes,Gender,AGE,Id\nHomeless,No,CRP 40,Antibiotics,9,4,J18.9,Female,81,P9";
        let records = Batch::parse(text, &ids()).expect("parse");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), "P9");
        assert_eq!(records[0].data().demographics.age, "81");
        assert_eq!(records[0].data().social_determinants.housing_situation, "Homeless");
        assert_eq!(records[0].data().medical_history.previous_admissions, "4");
    }

    #[test]
    fn extra_columns_are_ignored() {
        let text = format!("{HEADER},ward\nP1,50,Male,,0,2,,,No,Stable,7B");
        let records = Batch::parse(&text, &ids()).expect("parse");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data().social_determinants.housing_situation, "Stable");
    }

    #[test]
    fn rejects_header_only() {
        let err = Batch::parse(HEADER, &ids()).expect_err("should reject");
        assert!(matches!(err, CoreError::MissingHeaderOrData));
    }

    #[test]
    fn rejects_empty_text() {
        let err = Batch::parse("  \n \n", &ids()).expect_err("should reject");
        assert!(matches!(err, CoreError::MissingHeaderOrData));
    }

    #[test]
    fn missing_header_names_header_and_lists_detected() {
        let header = HEADER.replace("gender,", "");
        let text = format!("{header}\nP1,50,E11,1,2,x,y,Yes,Stable");
        let err = Batch::parse(&text, &ids()).expect_err("should reject");

        match &err {
            CoreError::MissingHeader {
                missing, detected, ..
            } => {
                assert_eq!(missing, "gender");
                assert!(detected.contains("diagnosiscodes"));
            }
            other => panic!("expected MissingHeader, got {other:?}"),
        }
        assert!(err.to_string().contains("gender"));
    }

    #[test]
    fn skips_row_with_missing_trailing_column() {
        let text = format!(
            "{HEADER}\nP1,60,Male,I10,1,3,a,b,Yes,Stable\nP2,70,Female,I10,1,3,a,b,Yes\nP3,80,Other,I10,1,3,a,b,No,Unstable"
        );
        let report = Batch::parse_with_report(&text, &ids()).expect("parse");

        let ids: Vec<&str> = report.records.iter().map(PatientRecord::id).collect();
        assert_eq!(ids, vec!["P1", "P3"]);
        assert_eq!(
            report.skipped_rows,
            vec![SkippedRow {
                line: 3,
                expected_columns: 10,
                actual_columns: 9,
            }]
        );
    }

    #[test]
    fn every_row_mismatched_yields_empty_batch() {
        let text = format!("{HEADER}\nP1,60\nP2,70,Female");
        let records = Batch::parse(&text, &ids()).expect("parse succeeds");
        assert!(records.is_empty());
    }

    #[test]
    fn comma_inside_value_shifts_columns_and_skips_row() {
        let text = format!("{HEADER}\nP1,60,Male,\"E11.9,I10\",1,3,a,b,Yes,Stable");
        let report = Batch::parse_with_report(&text, &ids()).expect("parse");
        assert!(report.records.is_empty());
        assert_eq!(report.skipped_rows[0].actual_columns, 11);
    }

    #[test]
    fn generates_id_when_missing() {
        let text = format!("{HEADER}\n,60,Male,I10,1,3,a,b,Yes,Stable\n  ,61,Male,I10,1,3,a,b,Yes,Stable");
        let records = Batch::parse(&text, &ids()).expect("parse");

        assert_eq!(records[0].id(), "test_1");
        assert_eq!(records[1].id(), "test_2");
    }

    #[test]
    fn handles_crlf_line_endings() {
        let text = format!("{HEADER}\r\nP1,60,Male,I10,1,3,a,b,Yes,Stable\r\n");
        let records = Batch::parse(&text, &ids()).expect("parse");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data().social_determinants.housing_situation, "Stable");
    }

    #[test]
    fn duplicate_ids_are_kept() {
        let text = format!(
            "{HEADER}\nP1,60,Male,I10,1,3,a,b,Yes,Stable\nP1,61,Male,I10,1,3,a,b,Yes,Stable"
        );
        let records = Batch::parse(&text, &ids()).expect("parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].data().demographics.age, "61");
    }

    #[test]
    fn render_then_parse_reproduces_records() {
        let text = format!(
            "{HEADER}\nP1,60,Male,I10,1,3,Rehab,Na 131,Yes,Stable\n,72,Female,E11.9 J44,4,8.5,,eGFR 38,No,Homeless"
        );
        let generator = ids();
        let records = Batch::parse(&text, &generator).expect("parse");

        let rendered = Batch::render(&records);
        let reparsed = Batch::parse(&rendered, &generator).expect("reparse");

        assert_eq!(reparsed, records);
        assert!(rendered.starts_with(HEADER));
    }
}
