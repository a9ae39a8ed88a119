//! Git data structures and algorithms
//!
//! - `branch`: ref names and revision parsing
//! - `core`: shared utilities (pager wrapper)
//! - `database`: raw object records as stored
//! - `log`: commit history traversal, policies and entry history
//! - `objects`: Git object types (blob, tree, commit, tag)

pub mod branch;
pub mod core;
pub mod database;
pub mod log;
pub mod objects;
