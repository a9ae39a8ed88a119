//! Porcelain commands
//!
//! ## Commands
//!
//! - `log`: Show commit history, optionally filtered by path or keyword
//! - `count`: Count commits, or the commits that changed given paths
//! - `last-commits`: Last change of every entry of a directory
//! - `branch`, `tag`: List refs, create tags, move HEAD

pub mod count;
pub mod last_commits;
pub mod log;
pub mod refs;
