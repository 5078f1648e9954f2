//! Integration tests for the dispatch pipeline
//!
//! This test suite validates:
//! - End-to-end emergency flows across engine, lifecycle and registries
//! - The upstream distance/ETA response contract on a worked example
//! - Board consistency under parallel assignment contention
//! - Feed-to-journal audit capture

pub mod test_utils;

#[cfg(test)]
mod dispatch_flow_tests;

#[cfg(test)]
mod concurrency_tests;
