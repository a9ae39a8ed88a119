//! Commit history traversal
//!
//! - `rev_list`: the walker, emitting ancestors newest first, each once
//! - `visitor`: the policy contract (`Visitor`, `Filter`, `Chain`)
//! - `counter`, `pager`: count or page through accepted commits
//! - `path_filter`: accept commits that changed a path
//! - `searcher`: accept commits whose message mentions a keyword
//! - `last_commits`: concurrent last-change lookup for directory entries
//!
//! ## Algorithm
//!
//! The walk uses a priority queue ordered by commit timestamp. Policies only
//! see commits and answer with a signal; the walker knows nothing about what
//! they compute.

pub mod counter;
pub mod last_commits;
pub mod pager;
pub mod path_filter;
pub mod rev_list;
pub mod searcher;
pub mod visitor;
