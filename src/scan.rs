//! Rule-set discovery.
//!
//! Stage 1 of the pipeline. Walks the rules directory and returns every
//! rule-set file as a [`RulesetEntry`], in a deterministic order that every
//! later stage (conversion, backbone, menu) inherits.
//!
//! ## Directory Structure
//!
//! ```text
//! rulesets/                        # Root (its own files are rule-sets too)
//! ├── basic/
//! │   ├── EmptyRules.xml           # → basic/EmptyRules.md
//! │   └── Braces.xml               # → basic/Braces.md
//! ├── design/
//! │   └── Design.xml               # → design/Design.md
//! │   └── legacy/
//! │       └── Old.xml              # → legacy/Old.md
//! └── .svn/                        # Excluded directory, never entered
//! ```
//!
//! ## Order
//!
//! Within a directory, files come before sub-directories; both are sorted by
//! file name. Every directory is visited exactly once (symlinks are not
//! followed).

use crate::config::FilterConfig;
use crate::naming;
use crate::types::RulesetEntry;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("The rulesets directory specified '{0}' does not exist")]
    MissingRoot(PathBuf),
    #[error("The rulesets directory '{0}' provided is not a directory")]
    NotADirectory(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Filename filter for rule-set files and excluded directories.
#[derive(Debug, Clone)]
pub struct RulesetFilter {
    extension: String,
    exclude_files: Vec<String>,
    exclude_dirs: Vec<String>,
}

impl RulesetFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            extension: config.extension.clone(),
            exclude_files: config.exclude_files.clone(),
            exclude_dirs: config.exclude_dirs.clone(),
        }
    }

    /// Whether a file name is a rule-set file name.
    pub fn accepts_file(&self, file_name: &str) -> bool {
        if self.exclude_files.iter().any(|excluded| excluded == file_name) {
            return false;
        }
        Path::new(file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }

    /// Whether the walker may descend into a directory with this name.
    pub fn accepts_dir(&self, dir_name: &str) -> bool {
        !self.exclude_dirs.iter().any(|excluded| excluded == dir_name)
    }
}

impl Default for RulesetFilter {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}

/// Check the rules root, returning its canonical form.
///
/// Runs before anything is written so a bad root leaves no output behind.
pub fn check_root(root: &Path) -> Result<PathBuf, ScanError> {
    if !root.exists() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    fs::canonicalize(root).map_err(|source| ScanError::Io {
        path: root.to_path_buf(),
        source,
    })
}

/// Find every rule-set file under `root`.
pub fn scan_rulesets(root: &Path, filter: &RulesetFilter) -> Result<Vec<RulesetEntry>, ScanError> {
    let root = check_root(root)?;
    let mut entries = Vec::new();

    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by(files_first)
        .into_iter()
        .filter_entry(|entry| !is_excluded_dir(entry, filter));

    for entry in walker {
        let entry = entry.map_err(|source| ScanError::Walk {
            path: source.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone()),
            source,
        })?;
        if !is_ruleset_file(&entry) {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if !filter.accepts_file(&file_name) {
            continue;
        }
        let source = entry.into_path();
        debug!("found rule-set {}", source.display());
        entries.push(RulesetEntry {
            category: naming::category_of(&source),
            name: naming::name_of(&source),
            page: naming::relative_page_path(&source),
            source,
        });
    }

    warn_on_page_collisions(&entries);
    Ok(entries)
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_dir = a.file_type().is_dir();
    let b_dir = b.file_type().is_dir();
    a_dir
        .cmp(&b_dir)
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Symlinked files count; symlinked directories are not entered.
fn is_ruleset_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

fn is_excluded_dir(entry: &DirEntry, filter: &RulesetFilter) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && !filter.accepts_dir(&entry.file_name().to_string_lossy())
}

/// Same-named directories at different depths map to the same page; the
/// later file overwrites the earlier one.
fn warn_on_page_collisions(entries: &[RulesetEntry]) {
    let mut seen: HashMap<&Path, &Path> = HashMap::new();
    for entry in entries {
        if let Some(first) = seen.insert(entry.page.as_path(), entry.source.as_path()) {
            warn!(
                "{} and {} both convert to {}; the later one wins",
                first.display(),
                entry.source.display(),
                entry.page.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn relative_sources(root: &Path, entries: &[RulesetEntry]) -> Vec<String> {
        let root = fs::canonicalize(root).unwrap();
        entries
            .iter()
            .map(|e| naming::href(e.source.strip_prefix(&root).unwrap()))
            .collect()
    }

    #[test]
    fn finds_rulesets_at_every_depth() {
        let tmp = TempDir::new().unwrap();
        write_ruleset(tmp.path(), "a/One.xml", &[]);
        write_ruleset(tmp.path(), "a/b/Two.xml", &[]);
        write_ruleset(tmp.path(), "a/b/c/Three.xml", &[]);

        let entries = scan_rulesets(tmp.path(), &RulesetFilter::default()).unwrap();
        assert_eq!(
            relative_sources(tmp.path(), &entries),
            vec!["a/One.xml", "a/b/Two.xml", "a/b/c/Three.xml"]
        );
    }

    #[test]
    fn root_level_files_are_included() {
        let tmp = TempDir::new().unwrap();
        write_ruleset(tmp.path(), "Top.xml", &[]);

        let entries = scan_rulesets(tmp.path(), &RulesetFilter::default()).unwrap();
        assert_eq!(entries.len(), 1);
        let root_name = fs::canonicalize(tmp.path())
            .unwrap()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        assert_eq!(entries[0].category, root_name);
    }

    #[test]
    fn files_before_directories_sorted_by_name() {
        let tmp = TempDir::new().unwrap();
        write_ruleset(tmp.path(), "r/zeta/Z.xml", &[]);
        write_ruleset(tmp.path(), "r/B.xml", &[]);
        write_ruleset(tmp.path(), "r/alpha/A.xml", &[]);
        write_ruleset(tmp.path(), "r/A.xml", &[]);

        let entries = scan_rulesets(&tmp.path().join("r"), &RulesetFilter::default()).unwrap();
        assert_eq!(
            relative_sources(&tmp.path().join("r"), &entries),
            vec!["A.xml", "B.xml", "alpha/A.xml", "zeta/Z.xml"]
        );
    }

    #[test]
    fn order_is_stable_across_runs() {
        let tmp = TempDir::new().unwrap();
        for path in ["x/One.xml", "y/Two.xml", "x/z/Three.xml", "Four.xml"] {
            write_ruleset(tmp.path(), path, &[]);
        }
        let first = scan_rulesets(tmp.path(), &RulesetFilter::default()).unwrap();
        let second = scan_rulesets(tmp.path(), &RulesetFilter::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn non_matching_files_ignored() {
        let tmp = TempDir::new().unwrap();
        write_ruleset(tmp.path(), "basic/Rules.xml", &[]);
        fs::write(tmp.path().join("basic/notes.txt"), "x").unwrap();
        fs::write(tmp.path().join("basic/rulesets.properties"), "x").unwrap();

        let entries = scan_rulesets(tmp.path(), &RulesetFilter::default()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Rules");
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        write_ruleset(tmp.path(), "basic/Upper.XML", &[]);
        let entries = scan_rulesets(tmp.path(), &RulesetFilter::default()).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn excluded_files_skipped() {
        let tmp = TempDir::new().unwrap();
        write_ruleset(tmp.path(), "basic/Rules.xml", &[]);
        write_ruleset(tmp.path(), "basic/dogfood.xml", &[]);

        let filter = RulesetFilter::new(&FilterConfig {
            exclude_files: vec!["dogfood.xml".to_string()],
            ..FilterConfig::default()
        });
        let entries = scan_rulesets(tmp.path(), &filter).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Rules");
    }

    #[test]
    fn excluded_directories_not_entered() {
        let tmp = TempDir::new().unwrap();
        write_ruleset(tmp.path(), "basic/Rules.xml", &[]);
        write_ruleset(tmp.path(), ".svn/text-base/Rules.xml", &[]);
        write_ruleset(tmp.path(), "basic/.git/Hidden.xml", &[]);

        let entries = scan_rulesets(tmp.path(), &RulesetFilter::default()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, "basic");
    }

    #[test]
    fn directory_with_ruleset_extension_is_not_a_ruleset() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("weird.xml")).unwrap();
        write_ruleset(tmp.path(), "weird.xml/Inner.xml", &[]);

        let entries = scan_rulesets(tmp.path(), &RulesetFilter::default()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Inner");
        assert_eq!(entries[0].category, "weird.xml");
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_ruleset_file_is_included() {
        let tmp = TempDir::new().unwrap();
        let real = write_ruleset(tmp.path(), "shared/Real.xml", &[]);
        let rules = tmp.path().join("rules");
        write_ruleset(&rules, "basic/Plain.xml", &[]);
        std::os::unix::fs::symlink(&real, rules.join("basic/Linked.xml")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone.xml"), rules.join("basic/Broken.xml"))
            .unwrap();

        let entries = scan_rulesets(&rules, &RulesetFilter::default()).unwrap();
        assert_eq!(relative_sources(&rules, &entries), vec!["basic/Linked.xml", "basic/Plain.xml"]);
        assert_eq!(entries[0].category, "basic");
        assert_eq!(entries[0].name, "Linked");
        assert_eq!(entries[0].page_href(), "basic/Linked.md");
    }

    #[test]
    fn entry_page_mirrors_parent_directory() {
        let tmp = TempDir::new().unwrap();
        write_ruleset(tmp.path(), "a/Foo.xml", &[]);
        write_ruleset(tmp.path(), "b/Foo.xml", &[]);

        let entries = scan_rulesets(tmp.path(), &RulesetFilter::default()).unwrap();
        let pages: Vec<String> = entries.iter().map(|e| e.page_href()).collect();
        assert_eq!(pages, vec!["a/Foo.md", "b/Foo.md"]);
    }

    #[test]
    fn sources_are_absolute() {
        let tmp = TempDir::new().unwrap();
        write_ruleset(tmp.path(), "basic/Rules.xml", &[]);
        let entries = scan_rulesets(tmp.path(), &RulesetFilter::default()).unwrap();
        assert!(entries[0].source.is_absolute());
    }

    #[test]
    fn empty_root_yields_nothing() {
        let tmp = TempDir::new().unwrap();
        let entries = scan_rulesets(tmp.path(), &RulesetFilter::default()).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn missing_root_is_configuration_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        let err = scan_rulesets(&missing, &RulesetFilter::default()).unwrap_err();
        assert!(matches!(&err, ScanError::MissingRoot(p) if p == &missing));
        assert!(err.to_string().contains(&missing.display().to_string()));
    }

    #[test]
    fn file_root_is_configuration_error() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file.xml");
        fs::write(&file, "<ruleset/>").unwrap();
        let err = scan_rulesets(&file, &RulesetFilter::default()).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory(_)));
    }

    #[test]
    fn filter_accepts_and_rejects() {
        let filter = RulesetFilter::default();
        assert!(filter.accepts_file("Basic.xml"));
        assert!(!filter.accepts_file("Basic.xsl"));
        assert!(!filter.accepts_file("xml"));
        assert!(filter.accepts_dir("basic"));
        assert!(!filter.accepts_dir(".svn"));
    }
}
