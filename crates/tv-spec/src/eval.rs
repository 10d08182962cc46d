//! In-process execution of a [`ChartSpec`] pipeline
//!
//! The rendering engine runs the real pipeline. This evaluator exists so the
//! pipeline semantics can be previewed from the command line and checked in
//! tests against the same datasets.

use indexmap::IndexMap;
use serde_json::Value;
use tv_data::{BoundaryDataset, DataError, Record, TabularDataset, TabularRow};

use crate::spec::{Aggregate, AggregateOp, ChartSpec, DataSourceRef, LookupJoin, Predicate, TransformStep};

/// Both static datasets as pipeline records
#[derive(Debug, Clone, Default)]
pub struct Datasets {
    pub tabular: Vec<Record>,
    pub boundaries: Vec<Record>,
}

impl Datasets {
    pub fn load(tabular: &TabularDataset, boundaries: &BoundaryDataset) -> Result<Self, DataError> {
        Ok(Self {
            tabular: tabular.records()?,
            boundaries: boundaries.records().to_vec(),
        })
    }

    /// Tabular rows only, no boundaries
    pub fn from_rows(rows: &[TabularRow]) -> Result<Self, DataError> {
        let tabular = TabularDataset::from_rows(rows)?;
        Ok(Self {
            tabular: tabular.records()?,
            boundaries: Vec::new(),
        })
    }

    fn source(&self, source: &DataSourceRef) -> &[Record] {
        match source {
            DataSourceRef::Tabular { .. } => &self.tabular,
            DataSourceRef::Boundaries { .. } => &self.boundaries,
        }
    }
}

/// Run the spec's transform pipeline and return the rows the marks are drawn from
pub fn evaluate(spec: &ChartSpec, datasets: &Datasets) -> Vec<Record> {
    let mut rows = datasets.source(&spec.data).to_vec();

    for step in &spec.transform {
        rows = match step {
            TransformStep::Filter { predicate } => {
                rows.into_iter().filter(|row| matches(row, predicate)).collect()
            }
            TransformStep::LookupJoin(join) => lookup(rows, join, datasets),
            TransformStep::Aggregate(aggregate) => aggregate_rows(&rows, aggregate),
        };
    }

    tracing::debug!(lens = %spec.lens, rows = rows.len(), "Evaluated chart spec");
    rows
}

/// Value at a field path. A literal key wins over dotted traversal, so the
/// output of an aggregation grouped by a nested field can be read back.
pub fn field_value<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    if let Some(value) = record.get(path) {
        return Some(value);
    }

    let mut parts = path.split('.');
    let mut current = record.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Whether `record` is drawn with the spec's highlight emphasis
pub fn is_highlighted(spec: &ChartSpec, record: &Record) -> bool {
    let Some(highlight) = &spec.encoding.highlight else {
        return false;
    };
    field_value(record, &highlight.field)
        .and_then(Value::as_str)
        .is_some_and(|value| highlight.matches(value))
}

fn matches(record: &Record, predicate: &Predicate) -> bool {
    field_value(record, &predicate.field)
        .and_then(Value::as_str)
        .map_or(false, |value| value == predicate.equals)
}

/// Left join: one output row per matching external row, or the original row
/// with null fields when nothing matches
fn lookup(rows: Vec<Record>, join: &LookupJoin, datasets: &Datasets) -> Vec<Record> {
    let external: Vec<&Record> = datasets
        .source(&join.from)
        .iter()
        .filter(|row| join.from_filter.iter().all(|predicate| matches(row, predicate)))
        .collect();

    let mut joined = Vec::with_capacity(rows.len());
    for row in rows {
        let key = field_value(&row, &join.key).and_then(Value::as_str).map(|local| {
            join.translate
                .iter()
                .find(|[from, _]| from == local)
                .map_or(local, |[_, to]| to.as_str())
                .to_string()
        });

        let hits: Vec<&Record> = match &key {
            Some(key) => external
                .iter()
                .copied()
                .filter(|other| field_value(other, &join.from_key).and_then(Value::as_str) == Some(key.as_str()))
                .collect(),
            None => Vec::new(),
        };

        if hits.is_empty() {
            let mut unmatched = row;
            for field in &join.fields {
                unmatched.insert(field.clone(), Value::Null);
            }
            joined.push(unmatched);
            continue;
        }

        for hit in hits {
            let mut matched = row.clone();
            for field in &join.fields {
                let value = field_value(hit, field).cloned().unwrap_or(Value::Null);
                matched.insert(field.clone(), value);
            }
            joined.push(matched);
        }
    }
    joined
}

#[derive(Default)]
struct Total {
    integer: i64,
    float: f64,
    is_float: bool,
}

impl Total {
    fn add(&mut self, value: Option<&Value>) {
        // Missing and null counts contribute nothing
        let Some(Value::Number(n)) = value else { return };

        if !self.is_float {
            if let Some(sum) = n.as_i64().and_then(|i| self.integer.checked_add(i)) {
                self.integer = sum;
                return;
            }
            // Non-integer or overflowing totals continue as floats
            self.float = self.integer as f64;
            self.is_float = true;
        }
        self.float += n.as_f64().unwrap_or(0.0);
    }

    fn into_value(self) -> Value {
        if self.is_float {
            Value::from(self.float)
        } else {
            Value::from(self.integer)
        }
    }
}

fn aggregate_rows(rows: &[Record], aggregate: &Aggregate) -> Vec<Record> {
    let AggregateOp::Sum = aggregate.op;

    let mut groups: IndexMap<Vec<String>, (Vec<Value>, Total)> = IndexMap::new();
    for row in rows {
        let values: Vec<Value> = aggregate
            .group_by
            .iter()
            .map(|field| field_value(row, field).cloned().unwrap_or(Value::Null))
            .collect();
        let key = values.iter().map(Value::to_string).collect();

        groups
            .entry(key)
            .or_insert_with(|| (values, Total::default()))
            .1
            .add(field_value(row, &aggregate.field));
    }

    groups
        .into_values()
        .map(|(values, total)| {
            let mut record = Record::new();
            for (field, value) in aggregate.group_by.iter().zip(values) {
                record.insert(field.clone(), value);
            }
            record.insert(aggregate.as_field.clone(), total.into_value());
            record
        })
        .collect()
}
