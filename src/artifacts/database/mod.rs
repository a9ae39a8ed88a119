//! Raw records exchanged with the object store
//!
//! These are the decoded bodies of loose objects, before they are lifted
//! into the object model (`artifacts::objects`).

pub mod commit_record;
pub mod database_entry;
pub mod tag_record;
