//! Trade log and analyzer (C14)
//!
//! Every execution attempt, successful or not, dry-run or live, is
//! appended to the JSONL trade log. The analyzer reads that log back
//! independently of the running engine to produce summary reports.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

mod analyzer;
mod json_log;

pub use analyzer::{analyze, AnalysisReport, Totals};
pub use json_log::TradeLogWriter;
