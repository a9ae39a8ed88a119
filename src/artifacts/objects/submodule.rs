//! Submodules recorded in `.gitmodules`

use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;
use std::collections::BTreeMap;

/// Name of the file listing a commit's submodules
pub const GITMODULES_PATH: &str = ".gitmodules";

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct SubModule {
    pub path: String,
    pub url: String,
}

/// Submodules of a commit, keyed by path
pub type SubModules = BTreeMap<String, SubModule>;

/// Parse the `path` and `url` keys of every `[submodule "..."]` section
///
/// Sections missing either key are skipped, as are all other sections.
pub fn parse_gitmodules(content: &str) -> SubModules {
    let mut modules = SubModules::new();
    let mut in_submodule = false;
    let mut path = None;
    let mut url = None;

    let mut flush = |path: &mut Option<String>, url: &mut Option<String>| {
        if let (Some(path), Some(url)) = (path.take(), url.take()) {
            modules.insert(path.clone(), SubModule::new(path, url));
        }
    };

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            flush(&mut path, &mut url);
            in_submodule = line.starts_with("[submodule");
            continue;
        }
        if !in_submodule || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            match key.trim() {
                "path" => path = Some(value.trim().to_string()),
                "url" => url = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }
    flush(&mut path, &mut url);

    modules
}

/// The last commit that changed a submodule entry, with the submodule's
/// URL and the commit it pins
#[derive(Debug, Clone, new)]
pub struct SubModuleFile {
    pub commit: Commit,
    pub url: String,
    pub ref_id: ObjectId,
}
