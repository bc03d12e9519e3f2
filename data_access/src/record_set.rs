//! Result sets and output shaping
//!
//! Executors return a [`RawResult`]; [`shape`] turns it into the typed
//! [`ProcedureOutput`] requested by the caller.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::call::ExpectedReturn;
use crate::errors::DataAccessError;

/// One decoded row: column name to JSON value
pub type Row = serde_json::Map<String, serde_json::Value>;

/// One tabular result plus the overall per-statement affected-row counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSet<T = Row> {
    pub recordset: Vec<T>,
    pub rows_affected: Vec<u64>,
}

impl<T> RecordSet<T> {
    pub fn is_empty(&self) -> bool {
        self.recordset.is_empty()
    }

    pub fn len(&self) -> usize {
        self.recordset.len()
    }
}

impl<T> Default for RecordSet<T> {
    fn default() -> Self {
        Self {
            recordset: Vec::new(),
            rows_affected: Vec::new(),
        }
    }
}

impl RecordSet<Row> {
    /// Deserialize every row into `U`
    pub fn decode<U: DeserializeOwned>(self) -> Result<RecordSet<U>, DataAccessError> {
        let recordset = self
            .recordset
            .into_iter()
            .map(|row| serde_json::from_value(serde_json::Value::Object(row)))
            .collect::<Result<Vec<U>, _>>()?;
        Ok(RecordSet {
            recordset,
            rows_affected: self.rows_affected,
        })
    }
}

/// Everything a routine produced, before shaping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResult {
    pub recordsets: Vec<Vec<Row>>,
    pub rows_affected: Vec<u64>,
}

impl RawResult {
    /// Build from result sets, counting one statement per set
    pub fn from_sets(recordsets: Vec<Vec<Row>>) -> Self {
        let rows_affected = recordsets.iter().map(|set| set.len() as u64).collect();
        Self {
            recordsets,
            rows_affected,
        }
    }
}

/// Routine output, shaped by [`ExpectedReturn`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProcedureOutput<T = Row> {
    /// Statement executed; nothing returned
    None,
    /// First row of the first result set; `None` when there were no rows
    Single(Option<T>),
    /// One record set per result set, in order
    Multi(Vec<RecordSet<T>>),
    /// Record sets keyed by the caller-supplied names
    Named(BTreeMap<String, RecordSet<T>>),
}

impl<T> ProcedureOutput<T> {
    pub fn kind(&self) -> &'static str {
        match self {
            ProcedureOutput::None => "None",
            ProcedureOutput::Single(_) => "Single",
            ProcedureOutput::Multi(_) => "Multi",
            ProcedureOutput::Named(_) => "Named",
        }
    }

    fn mismatch(&self, expected: &'static str) -> DataAccessError {
        DataAccessError::ShapeMismatch {
            expected,
            actual: self.kind(),
        }
    }

    pub fn into_single(self) -> Result<Option<T>, DataAccessError> {
        match self {
            ProcedureOutput::Single(row) => Ok(row),
            other => Err(other.mismatch("Single")),
        }
    }

    pub fn into_multi(self) -> Result<Vec<RecordSet<T>>, DataAccessError> {
        match self {
            ProcedureOutput::Multi(sets) => Ok(sets),
            other => Err(other.mismatch("Multi")),
        }
    }

    pub fn into_named(self) -> Result<BTreeMap<String, RecordSet<T>>, DataAccessError> {
        match self {
            ProcedureOutput::Named(sets) => Ok(sets),
            other => Err(other.mismatch("Named")),
        }
    }
}

impl ProcedureOutput<Row> {
    /// Deserialize every row into a caller type
    pub fn decode<U: DeserializeOwned>(self) -> Result<ProcedureOutput<U>, DataAccessError> {
        Ok(match self {
            ProcedureOutput::None => ProcedureOutput::None,
            ProcedureOutput::Single(row) => ProcedureOutput::Single(
                row.map(|row| serde_json::from_value(serde_json::Value::Object(row)))
                    .transpose()?,
            ),
            ProcedureOutput::Multi(sets) => ProcedureOutput::Multi(
                sets.into_iter()
                    .map(RecordSet::decode)
                    .collect::<Result<_, _>>()?,
            ),
            ProcedureOutput::Named(sets) => ProcedureOutput::Named(
                sets.into_iter()
                    .map(|(name, set)| Ok((name, set.decode()?)))
                    .collect::<Result<_, DataAccessError>>()?,
            ),
        })
    }
}

/// Normalize raw routine output.
///
/// `Multi` with a non-empty name list maps `names[i]` to result set `i`; names
/// past the last result set get an empty record set. A repeated name keeps the
/// later position. Every record set carries the overall affected-row vector.
pub fn shape(raw: RawResult, expected: ExpectedReturn, names: Option<&[String]>) -> ProcedureOutput {
    let RawResult {
        recordsets,
        rows_affected,
    } = raw;

    match expected {
        ExpectedReturn::None => ProcedureOutput::None,
        ExpectedReturn::Single => {
            ProcedureOutput::Single(recordsets.into_iter().next().and_then(|set| set.into_iter().next()))
        }
        ExpectedReturn::Multi => match names {
            Some(names) if !names.is_empty() => {
                let mut sets = recordsets.into_iter();
                let mut named = BTreeMap::new();
                for name in names {
                    named.insert(
                        name.clone(),
                        RecordSet {
                            recordset: sets.next().unwrap_or_default(),
                            rows_affected: rows_affected.clone(),
                        },
                    );
                }
                ProcedureOutput::Named(named)
            }
            _ => ProcedureOutput::Multi(
                recordsets
                    .into_iter()
                    .map(|recordset| RecordSet {
                        recordset,
                        rows_affected: rows_affected.clone(),
                    })
                    .collect(),
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn none_discards_everything() {
        let raw = RawResult::from_sets(vec![vec![row(json!({"id": 1}))]]);
        assert_eq!(shape(raw, ExpectedReturn::None, None), ProcedureOutput::None);
    }

    #[test]
    fn single_takes_first_row_of_first_set() {
        let raw = RawResult::from_sets(vec![
            vec![row(json!({"id": 1})), row(json!({"id": 2}))],
            vec![row(json!({"id": 3}))],
        ]);
        let single = shape(raw, ExpectedReturn::Single, None).into_single().unwrap();
        assert_eq!(single, Some(row(json!({"id": 1}))));
    }

    #[test]
    fn single_without_rows_is_absent_not_an_error() {
        let empty_set = RawResult::from_sets(vec![vec![]]);
        assert_eq!(
            shape(empty_set, ExpectedReturn::Single, None).into_single().unwrap(),
            None
        );

        let no_sets = RawResult::default();
        assert_eq!(
            shape(no_sets, ExpectedReturn::Single, None).into_single().unwrap(),
            None
        );
    }

    #[test]
    fn single_keeps_all_null_row() {
        let raw = RawResult::from_sets(vec![vec![row(json!({"title": null}))]]);
        let single = shape(raw, ExpectedReturn::Single, None).into_single().unwrap();
        assert_eq!(single, Some(row(json!({"title": null}))));
    }

    #[test]
    fn multi_unnamed_returns_every_set_with_shared_counts() {
        let raw = RawResult::from_sets(vec![
            vec![row(json!({"a": 1}))],
            vec![],
            vec![row(json!({"b": 1})), row(json!({"b": 2}))],
        ]);
        let sets = shape(raw, ExpectedReturn::Multi, None).into_multi().unwrap();
        assert_eq!(sets.len(), 3);
        for set in &sets {
            assert_eq!(set.rows_affected, vec![1, 0, 2]);
        }
        assert_eq!(sets[2].len(), 2);
    }

    #[test]
    fn multi_with_empty_names_behaves_unnamed() {
        let raw = RawResult::from_sets(vec![vec![row(json!({"a": 1}))]]);
        let empty: Vec<String> = vec![];
        let output = shape(raw, ExpectedReturn::Multi, Some(&empty));
        assert_eq!(output.kind(), "Multi");
    }

    #[test]
    fn multi_named_maps_positionally() {
        let raw = RawResult::from_sets(vec![
            vec![row(json!({"id": 7}))],
            vec![
                row(json!({"line": 1})),
                row(json!({"line": 2})),
                row(json!({"line": 3})),
            ],
        ]);
        let named = shape(raw, ExpectedReturn::Multi, Some(&names(&["header", "lines"])))
            .into_named()
            .unwrap();

        assert_eq!(named["header"].recordset, vec![row(json!({"id": 7}))]);
        assert_eq!(named["lines"].len(), 3);
        assert_eq!(named["header"].rows_affected, vec![1, 3]);
        assert_eq!(named["lines"].rows_affected, vec![1, 3]);
    }

    #[test]
    fn multi_named_pads_missing_sets_with_empty_record_sets() {
        let raw = RawResult::from_sets(vec![vec![row(json!({"id": 7}))]]);
        let named = shape(
            raw,
            ExpectedReturn::Multi,
            Some(&names(&["header", "lines", "totals"])),
        )
        .into_named()
        .unwrap();

        assert_eq!(named.len(), 3);
        assert!(named["lines"].is_empty());
        assert!(named["totals"].is_empty());
        assert_eq!(named["totals"].rows_affected, vec![1]);
    }

    #[test]
    fn repeated_name_keeps_later_position() {
        let raw = RawResult::from_sets(vec![
            vec![row(json!({"pos": 0}))],
            vec![row(json!({"pos": 1}))],
        ]);
        let named = shape(raw, ExpectedReturn::Multi, Some(&names(&["x", "x"])))
            .into_named()
            .unwrap();
        assert_eq!(named.len(), 1);
        assert_eq!(named["x"].recordset, vec![row(json!({"pos": 1}))]);
    }

    #[test]
    fn accessor_on_wrong_shape_fails() {
        let err = ProcedureOutput::<Row>::None.into_single().unwrap_err();
        assert!(matches!(
            err,
            DataAccessError::ShapeMismatch {
                expected: "Single",
                actual: "None"
            }
        ));
    }

    #[test]
    fn decode_into_caller_type() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Header {
            id: i64,
        }

        let raw = RawResult::from_sets(vec![vec![row(json!({"id": 7}))]]);
        let typed = shape(raw, ExpectedReturn::Single, None)
            .decode::<Header>()
            .unwrap()
            .into_single()
            .unwrap();
        assert_eq!(typed, Some(Header { id: 7 }));
    }

    #[test]
    fn serializes_to_wire_shape() {
        let raw = RawResult::from_sets(vec![vec![row(json!({"id": 7}))]]);
        let named = shape(raw, ExpectedReturn::Multi, Some(&names(&["header"])));
        assert_eq!(
            serde_json::to_value(&named).unwrap(),
            json!({"header": {"recordset": [{"id": 7}], "rowsAffected": [1]}})
        );
        assert_eq!(
            serde_json::to_value(ProcedureOutput::<Row>::Single(None)).unwrap(),
            json!(null)
        );
    }
}
