//! Aggregation of board issues into enriched rows.

mod epic;
mod pipeline;
mod row;
mod sprint;
mod versions;

pub use pipeline::{Pipeline, PipelineError, PipelineSettings};
pub use row::{AggregationResult, EnrichedRow};
