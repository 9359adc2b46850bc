//! The correctness-critical heart of otime: a pure result engine plus the
//! ranking and series aggregation built on top of it.
//!
//! Nothing in this crate performs I/O or blocks; every function is a pure
//! mapping from inputs to outputs, which is what makes results reproducible
//! and the engine trivially testable.

pub mod compute;
pub mod handicap;
pub mod ranking;
pub mod series;

pub use compute::compute_result;
pub use ranking::build_class_results;
pub use series::build_series_totals;
