use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::branch::{ANCESTOR_REGEX, PARENT_REGEX, REF_ALIASES};
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, Result};
use std::sync::LazyLock;

static PARENT: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(PARENT_REGEX).expect("parent regex is valid"));
static ANCESTOR: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(ANCESTOR_REGEX).expect("ancestor regex is valid"));

/// Minimum length of an abbreviated object id
const MIN_OID_PREFIX: usize = 4;

/// A revision expression naming a commit
///
/// Supports:
/// - Ref names: `main`, `feature/x`, `refs/heads/main`, `v1.0`, `HEAD`
/// - Aliases: `@` (resolves to `HEAD`)
/// - Full or abbreviated (4+ hex characters) object ids, tried when no ref
///   with that name exists
/// - Parent notation: `<revision>^`
/// - Ancestor notation: `<revision>~<n>` (first parents only)
#[derive(Debug, Clone, PartialEq)]
pub enum Revision {
    /// A ref, or an object id resolved as fallback
    Ref(BranchName),
    /// The Nth first-parent ancestor of a revision
    Ancestor(Box<Revision>, usize),
    /// The first parent of a revision
    Parent(Box<Revision>),
}

impl Revision {
    pub fn try_parse(revision: &str) -> Result<Revision> {
        if let Some(caps) = PARENT.captures(revision) {
            let base_revision = Self::try_parse(&caps[1])?;

            Ok(Revision::Parent(Box::new(base_revision)))
        } else if let Some(caps) = ANCESTOR.captures(revision) {
            let generations: usize = caps[2]
                .parse()
                .map_err(|_| Error::InvalidRevision(revision.to_string()))?;
            let base_revision = Self::try_parse(&caps[1])?;

            Ok(Revision::Ancestor(Box::new(base_revision), generations))
        } else {
            let resolved_name = *REF_ALIASES.get(revision).unwrap_or(&revision);
            Ok(Revision::Ref(BranchName::try_parse(resolved_name)?))
        }
    }

    /// Resolve to the id of a commit; tags are peeled to what they tag
    pub fn resolve(&self, repository: &Repository) -> Result<ObjectId> {
        match self {
            Revision::Ref(name) => {
                let name = name.as_ref();
                match repository.store().resolve_ref(name) {
                    Ok(oid) => Ok(*repository.peel_to_commit(&oid)?.oid()),
                    Err(Error::NotFound(_)) if Self::looks_like_oid(name) => Self::resolve_oid(name, repository),
                    Err(err) => Err(err),
                }
            }
            Revision::Parent(base_revision) => Self::first_parent(self, base_revision.resolve(repository)?, repository),
            Revision::Ancestor(base_revision, generations) => {
                let mut oid = base_revision.resolve(repository)?;
                for _ in 0..*generations {
                    oid = Self::first_parent(self, oid, repository)?;
                }

                Ok(oid)
            }
        }
    }

    fn first_parent(&self, oid: ObjectId, repository: &Repository) -> Result<ObjectId> {
        repository
            .load_commit(&oid)?
            .parent(0)
            .copied()
            .ok_or_else(|| Error::NotFound(self.to_string()))
    }

    fn resolve_oid(oid_str: &str, repository: &Repository) -> Result<ObjectId> {
        if oid_str.len() == OBJECT_ID_LENGTH {
            let oid = ObjectId::try_parse(oid_str)?;
            return Ok(*repository.peel_to_commit(&oid)?.oid());
        }

        let matches = repository.store().find_objects_by_prefix(oid_str)?;
        let commit_matches = matches
            .into_iter()
            .filter(|oid| {
                repository
                    .store()
                    .stat_object(oid)
                    .is_ok_and(|info| info.object_type == ObjectType::Commit)
            })
            .collect::<Vec<_>>();

        match commit_matches.as_slice() {
            [] => Err(Error::NotFound(oid_str.to_string())),
            [oid] => Ok(*oid),
            candidates => {
                let mut error_msg = format!("short SHA1 {oid_str} is ambiguous\nhint: The candidates are:");
                for oid in candidates {
                    error_msg.push_str(&format!("\nhint:   {} commit", oid.to_short_oid()));
                }
                Err(Error::InvalidRevision(error_msg))
            }
        }
    }

    fn looks_like_oid(s: &str) -> bool {
        (MIN_OID_PREFIX..=OBJECT_ID_LENGTH).contains(&s.len()) && s.chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Revision::Ref(name) => write!(f, "{name}"),
            Revision::Parent(base) => write!(f, "{base}^"),
            Revision::Ancestor(base, generations) => write!(f, "{base}~{generations}"),
        }
    }
}
