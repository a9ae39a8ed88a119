//! History traversal over a content-addressed object store
//!
//! - `areas`: the object store, refs and the `Repository` host API
//! - `artifacts`: object model, revision names and the history engine
//! - `commands`: output routines behind the `lineage` binary
//! - `config`: runtime tuning
//! - `errors`: the error kinds every operation reports

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod config;
pub mod errors;

#[cfg(test)]
mod test_support;
