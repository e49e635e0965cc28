//! Benchmark fan-out results.

pub mod result;

pub use result::{BenchmarkReport, BenchmarkResult, BenchmarkSummary};
