//! ODDSIGHT: betting odds extraction and probability analysis.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod extractor;
pub mod ocr;
pub mod storage;
pub mod report;
pub mod service;
