use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use arrow::array::{Array, ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DataError, Record};

/// Region column of the tabular dataset
pub const STATE_COLUMN: &str = "state";
/// Species group column
pub const GROUP_COLUMN: &str = "group";
/// Conservation status column
pub const STATUS_COLUMN: &str = "status";
/// Species count column
pub const COUNT_COLUMN: &str = "count";

/// One row of the counts file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularRow {
    pub state: String,
    pub group: String,
    pub status: String,
    pub count: i64,
}

impl TabularRow {
    pub fn new(state: &str, group: &str, status: &str, count: i64) -> Self {
        Self {
            state: state.to_string(),
            group: group.to_string(),
            status: status.to_string(),
            count,
        }
    }
}

/// The per-state, per-group counts held as a single arrow batch
#[derive(Debug, Clone)]
pub struct TabularDataset {
    batch: RecordBatch,
}

impl TabularDataset {
    /// Schema every tabular dataset is normalized to
    pub fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new(STATE_COLUMN, DataType::Utf8, false),
            Field::new(GROUP_COLUMN, DataType::Utf8, false),
            Field::new(STATUS_COLUMN, DataType::Utf8, false),
            Field::new(COUNT_COLUMN, DataType::Int64, false),
        ]))
    }

    /// Build from already parsed rows
    pub fn from_rows(rows: &[TabularRow]) -> Result<Self, DataError> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.state.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.group.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.status.as_str()))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.count))),
        ];
        let batch = RecordBatch::try_new(Self::schema(), columns)?;
        Ok(Self { batch })
    }

    /// Parse CSV with a header row. Extra columns are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        for required in [STATE_COLUMN, GROUP_COLUMN, STATUS_COLUMN, COUNT_COLUMN] {
            if !headers.iter().any(|h| h == required) {
                return Err(DataError::Schema(format!("missing column '{}'", required)));
            }
        }

        let rows = csv_reader
            .deserialize::<TabularRow>()
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_rows(&rows)
    }

    /// Load a CSV file from disk
    pub fn from_csv_path(path: &Path) -> Result<Self, DataError> {
        let file = File::open(path)?;
        let dataset = Self::from_reader(BufReader::new(file))?;
        tracing::info!("Loaded {} tabular rows from {}", dataset.num_rows(), path.display());
        Ok(dataset)
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Rows as pipeline records, in file order
    pub fn records(&self) -> Result<Vec<Record>, DataError> {
        let state = self.string_column(STATE_COLUMN)?;
        let group = self.string_column(GROUP_COLUMN)?;
        let status = self.string_column(STATUS_COLUMN)?;
        let count = self
            .batch
            .column_by_name(COUNT_COLUMN)
            .and_then(|col| col.as_any().downcast_ref::<Int64Array>())
            .ok_or_else(|| DataError::Schema(format!("column '{}' is not Int64", COUNT_COLUMN)))?;

        let records = (0..self.batch.num_rows())
            .map(|idx| {
                let mut record = Record::new();
                record.insert(STATE_COLUMN.to_string(), Value::from(state.value(idx)));
                record.insert(GROUP_COLUMN.to_string(), Value::from(group.value(idx)));
                record.insert(STATUS_COLUMN.to_string(), Value::from(status.value(idx)));
                let value = if count.is_null(idx) { Value::Null } else { Value::from(count.value(idx)) };
                record.insert(COUNT_COLUMN.to_string(), value);
                record
            })
            .collect();

        Ok(records)
    }

    fn string_column(&self, name: &str) -> Result<&StringArray, DataError> {
        self.batch
            .column_by_name(name)
            .and_then(|col| col.as_any().downcast_ref::<StringArray>())
            .ok_or_else(|| DataError::Schema(format!("column '{}' is not Utf8", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_csv_with_extra_columns() {
        let csv = "state,group,status,count,source\n\
                   Queensland, Mammals ,Vulnerable,5,EPBC\n\
                   Queensland,Birds,Endangered,3,EPBC\n";
        let dataset = TabularDataset::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.num_rows(), 2);

        let records = dataset.records().unwrap();
        assert_eq!(
            Value::Object(records[0].clone()),
            json!({ "state": "Queensland", "group": "Mammals", "status": "Vulnerable", "count": 5 })
        );
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let csv = "state,group,count\nQueensland,Birds,3\n";
        assert!(matches!(
            TabularDataset::from_reader(csv.as_bytes()),
            Err(DataError::Schema(msg)) if msg.contains("status")
        ));
    }

    #[test]
    fn test_bad_count_is_csv_error() {
        let csv = "state,group,status,count\nQueensland,Birds,Endangered,many\n";
        assert!(matches!(TabularDataset::from_reader(csv.as_bytes()), Err(DataError::Csv(_))));
    }

    #[test]
    fn test_empty_file_has_no_rows() {
        let dataset = TabularDataset::from_reader("state,group,status,count\n".as_bytes()).unwrap();
        assert_eq!(dataset.num_rows(), 0);
        assert!(dataset.records().unwrap().is_empty());
    }
}
