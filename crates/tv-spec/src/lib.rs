//! Chart specifications for the dashboard lenses
//!
//! [`SpecCompiler`] turns a selection snapshot into one [`ChartSpec`] per lens.
//! [`evaluate`] runs a spec's pipeline in-process for previews and tests.

pub mod compiler;
pub mod encoding;
pub mod eval;
pub mod spec;

pub use compiler::{compile, SpecCompiler};
pub use eval::{evaluate, is_highlighted, Datasets};
pub use spec::{
    Aggregate, AggregateOp, ChartSpec, ColorChannel, ColorScale, DataSourceRef, FieldType,
    Highlight, LookupJoin, Mark, MarkKind, PositionChannel, Predicate, StackMode, TooltipField,
    TransformStep, VisualEncoding, Width,
};
