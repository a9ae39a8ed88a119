use crate::artifacts::log::visitor::Filter;
use crate::artifacts::objects::commit::Commit;
use crate::errors::Result;

/// Accepts commits whose message contains a keyword, ignoring case
///
/// The keyword is matched literally.
#[derive(Debug, Clone)]
pub struct Searcher {
    keyword: String,
}

impl Searcher {
    pub fn new(keyword: &str) -> Self {
        Searcher {
            keyword: keyword.to_lowercase(),
        }
    }
}

impl Filter for Searcher {
    fn accepts(&mut self, commit: &Commit) -> Result<bool> {
        Ok(commit.message().to_lowercase().contains(&self.keyword))
    }
}
