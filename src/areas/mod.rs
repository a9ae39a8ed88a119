//! Storage and the host-facing repository
//!
//! - `database`: loose object database (`.git/objects`)
//! - `refs`: reference lookup and updates (branches, HEAD, tags)
//! - `store`: the object store contract and its on-disk implementation
//! - `repository`: high-level operations used by callers and the CLI

pub(crate) mod database;
pub(crate) mod refs;
pub mod repository;
pub mod store;
