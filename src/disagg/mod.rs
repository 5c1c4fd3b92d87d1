//! Storage operation disaggregation pipeline.

/// Recursive layer aggregation.
pub mod aggregate;
/// Output tables and valuation diagnostics.
pub mod assemble;
pub mod engine;
pub mod matcher;
/// SOC computation and origin rotation.
pub mod preprocess;
pub mod redistribute;
pub mod segment;
/// Shape extractors for redistribution.
pub mod shape;
pub mod types;
