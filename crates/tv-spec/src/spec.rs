//! Declarative chart specification
//!
//! A [`ChartSpec`] is a plain value: data source, ordered transform steps and a
//! visual encoding. It contains no maps with unstable iteration order, so equal
//! specs serialize to identical bytes and `==` is the structural diff used to
//! skip redundant renders.

use serde::{Serialize, Deserialize};
use tv_core::LensKind;
use tv_data::BoundaryFormat;

/// Which static dataset a spec (or a join) reads
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DataSourceRef {
    /// The per-state counts file
    Tabular { url: String },
    /// The region boundary file
    Boundaries {
        url: String,
        format: BoundaryFormat,
        #[serde(skip_serializing_if = "Option::is_none")]
        feature: Option<String>,
    },
}

/// Equality test on one field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Predicate {
    /// Field path; dots address nested properties
    pub field: String,
    pub equals: String,
}

impl Predicate {
    pub fn field_equals(field: impl Into<String>, equals: impl Into<String>) -> Self {
        Self { field: field.into(), equals: equals.into() }
    }
}

/// Left join of the current rows against another dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupJoin {
    /// Field on the current rows
    pub key: String,
    pub from: DataSourceRef,
    /// Field on the external rows
    pub from_key: String,
    /// Predicates applied to the external rows before joining
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from_filter: Vec<Predicate>,
    /// Rewrites of local key spellings to external ones, `[local, external]`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub translate: Vec<[String; 2]>,
    /// External fields copied onto each joined row
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    Sum,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub op: AggregateOp,
    pub field: String,
    #[serde(rename = "as")]
    pub as_field: String,
    pub group_by: Vec<String>,
}

/// One pipeline step
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TransformStep {
    Filter { predicate: Predicate },
    LookupJoin(LookupJoin),
    Aggregate(Aggregate),
}

impl TransformStep {
    pub fn is_filter(&self) -> bool {
        matches!(self, TransformStep::Filter { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkKind {
    Bar,
    Rect,
    Geoshape,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: MarkKind,
    pub tooltip: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_radius_end: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Nominal,
    Quantitative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackMode {
    Normalize,
}

/// An x or y channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionChannel {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_angle: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<StackMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ColorScale {
    /// Fixed domain mapped onto a fixed palette
    Categorical { domain: Vec<String>, range: Vec<String> },
    /// Named colour scheme, optionally over a fixed numeric domain
    Sequential {
        scheme: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        domain: Option<[u32; 2]>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorChannel {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub scale: ColorScale,
    pub legend: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TooltipField {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Emphasis drawn on marks whose `field` holds any of `one_of`, without
/// removing the others
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub field: String,
    pub one_of: Vec<String>,
    pub stroke_width: u32,
}

impl Highlight {
    pub fn matches(&self, value: &str) -> bool {
        self.one_of.iter().any(|candidate| candidate == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Width {
    /// Fill the container
    Container,
    Fixed(u32),
}

/// Mapping of fields to visual channels plus static styling
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualEncoding {
    pub title: String,
    pub width: Width,
    pub height: u32,
    pub mark: Mark,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<PositionChannel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<PositionChannel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_offset: Option<String>,
    pub color: ColorChannel,
    pub tooltip: Vec<TooltipField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Highlight>,
    pub grid: bool,
}

/// Everything the rendering engine needs to draw one lens
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChartSpec {
    pub lens: LensKind,
    pub data: DataSourceRef,
    pub transform: Vec<TransformStep>,
    pub encoding: VisualEncoding,
}

impl ChartSpec {
    /// Serialized form handed to the rendering engine
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// The filter predicates, in pipeline order
    pub fn filters(&self) -> Vec<&Predicate> {
        self.transform
            .iter()
            .filter_map(|step| match step {
                TransformStep::Filter { predicate } => Some(predicate),
                _ => None,
            })
            .collect()
    }

    /// The final aggregation step, if any
    pub fn aggregate(&self) -> Option<&Aggregate> {
        self.transform.iter().rev().find_map(|step| match step {
            TransformStep::Aggregate(aggregate) => Some(aggregate),
            _ => None,
        })
    }
}
