//! Tree entry modes
//!
//! Git only records a handful of modes. They look like unix file modes but
//! can only be one of these.

use crate::artifacts::objects::object_type::ObjectType;

#[derive(Debug, Clone, Copy, Eq, Ord, Default, PartialEq, PartialOrd, Hash)]
pub enum FileMode {
    #[default]
    Regular,
    Executable,
}

#[derive(Debug, Clone, Copy, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub enum EntryMode {
    File(FileMode),
    Symlink,
    Submodule,
    Directory,
}

impl EntryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryMode::File(FileMode::Regular) => "100644",
            EntryMode::File(FileMode::Executable) => "100755",
            EntryMode::Symlink => "120000",
            EntryMode::Submodule => "160000",
            EntryMode::Directory => "040000",
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::File(FileMode::Regular) => 0o100644,
            EntryMode::File(FileMode::Executable) => 0o100755,
            EntryMode::Symlink => 0o120000,
            EntryMode::Submodule => 0o160000,
            EntryMode::Directory => 0o40000,
        }
    }

    /// Parse the octal mode of a tree record (`40000`, `100644`, ...)
    pub fn from_octal_str(mode: &str) -> anyhow::Result<Self> {
        let mode = u32::from_str_radix(mode, 8)
            .map_err(|_| anyhow::anyhow!("Invalid entry mode: {mode}"))?;

        Self::try_from(mode)
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, EntryMode::Directory)
    }

    pub fn is_submodule(&self) -> bool {
        matches!(self, EntryMode::Submodule)
    }

    /// The kind of object an entry with this mode points to
    pub fn object_type(&self) -> ObjectType {
        match self {
            EntryMode::Directory => ObjectType::Tree,
            EntryMode::Submodule => ObjectType::Commit,
            EntryMode::File(_) | EntryMode::Symlink => ObjectType::Blob,
        }
    }
}

impl TryFrom<u32> for EntryMode {
    type Error = anyhow::Error;

    fn try_from(mode: u32) -> anyhow::Result<Self> {
        match mode {
            0o100644 | 0o100664 => Ok(EntryMode::File(FileMode::Regular)),
            0o100755 => Ok(EntryMode::File(FileMode::Executable)),
            0o120000 => Ok(EntryMode::Symlink),
            0o160000 => Ok(EntryMode::Submodule),
            0o40000 => Ok(EntryMode::Directory),
            _ => Err(anyhow::anyhow!("Invalid entry mode: {mode:o}")),
        }
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_mode() {
        assert_eq!(EntryMode::from_octal_str("40000").unwrap(), EntryMode::Directory);
        assert_eq!(EntryMode::from_octal_str("160000").unwrap(), EntryMode::Submodule);
        assert_eq!(EntryMode::from_octal_str("120000").unwrap(), EntryMode::Symlink);
        assert_eq!(
            EntryMode::from_octal_str("100755").unwrap(),
            EntryMode::File(FileMode::Executable)
        );
        assert_eq!(
            EntryMode::from_octal_str("100644").unwrap(),
            EntryMode::File(FileMode::Regular)
        );
    }

    #[test]
    fn rejects_unknown_modes() {
        assert!(EntryMode::from_octal_str("100600").is_err());
        assert!(EntryMode::from_octal_str("9").is_err());
    }

    #[test]
    fn submodules_point_at_commits() {
        assert_eq!(EntryMode::Submodule.object_type(), ObjectType::Commit);
        assert_eq!(EntryMode::Directory.object_type(), ObjectType::Tree);
        assert_eq!(EntryMode::Symlink.object_type(), ObjectType::Blob);
    }
}
