use crate::artifacts::branch::INVALID_BRANCH_NAME_REGEX;
use crate::errors::{Error, Result};
use std::sync::LazyLock;

static INVALID_BRANCH_NAME: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(INVALID_BRANCH_NAME_REGEX).expect("branch name regex is valid")
});

/// A name that is valid as a branch, tag or other ref name component
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchName(String);

impl BranchName {
    pub fn try_parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || INVALID_BRANCH_NAME.is_match(&name) {
            return Err(Error::InvalidRevision(format!("invalid ref name '{name}'")));
        }

        Ok(Self(name))
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("main")]
    #[case("feature/new-parser")]
    #[case("v1.0.0")]
    #[case("HEAD")]
    fn accepts_valid_names(#[case] name: &str) {
        assert_eq!(BranchName::try_parse(name).unwrap().as_ref(), name);
    }

    #[rstest]
    #[case("")]
    #[case(".hidden")]
    #[case("a..b")]
    #[case("/leading")]
    #[case("trailing/")]
    #[case("branch.lock")]
    #[case("with space")]
    #[case("colon:name")]
    #[case("at@{brace")]
    #[case("tilde~1")]
    fn rejects_invalid_names(#[case] name: &str) {
        assert!(matches!(BranchName::try_parse(name), Err(Error::InvalidRevision(_))));
    }
}
