//! Ignore-rule evaluation.
//!
//! The matcher walks the worktree once, loading every `.gitignore` it finds
//! with a prefix equal to the directory containing the file. Files inside
//! directories that are already ignored are not read. `.git` is implicitly
//! ignored. Later patterns override earlier ones, so a negation (`!`) in a
//! deeper `.gitignore` can re-include a path its parent excluded.

use std::path::{Path, PathBuf};

use bstr::{BStr, BString, ByteSlice};
use ngit_utils::wildmatch::Wildmatch;

use crate::IndexError;

/// A single parsed ignore pattern.
#[derive(Debug, Clone)]
struct IgnorePattern {
    matcher: Wildmatch,
    /// `!pattern`: re-include on match.
    negated: bool,
    /// `pattern/`: matches directories only.
    directory_only: bool,
    /// Pattern contains a slash, so it matches relative to its base dir.
    anchored: bool,
    /// Worktree-relative directory of the `.gitignore` this came from
    /// (empty for the root), with a trailing `/` when non-empty.
    prefix: BString,
}

/// Answers "is this worktree path ignored?".
pub struct IgnoreMatcher {
    work_tree: PathBuf,
    ignore_case: bool,
    patterns: Vec<IgnorePattern>,
}

impl IgnoreMatcher {
    pub fn new(work_tree: impl AsRef<Path>, ignore_case: bool) -> Self {
        Self {
            work_tree: work_tree.as_ref().to_path_buf(),
            ignore_case,
            patterns: Vec::new(),
        }
    }

    /// Walk the worktree and collect every reachable `.gitignore`.
    pub fn init(&mut self) -> Result<(), IndexError> {
        let root = self.work_tree.clone();
        self.collect_dir(&root, BStr::new(""))
    }

    fn collect_dir(&mut self, dir: &Path, prefix: &BStr) -> Result<(), IndexError> {
        self.load_ignore_file(&dir.join(".gitignore"), prefix)?;

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(IndexError::Io(e)),
        };

        let mut subdirs: Vec<(PathBuf, BString)> = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            if name == ".git" {
                continue;
            }
            if entry.file_type()?.is_dir() {
                let mut rel = BString::from(prefix);
                rel.extend_from_slice(name.to_string_lossy().as_bytes());
                subdirs.push((entry.path(), rel));
            }
        }
        subdirs.sort_by(|a, b| a.1.cmp(&b.1));

        for (path, rel) in subdirs {
            // .gitignore files under an ignored directory never apply.
            if self.is_ignored_dir(rel.as_bstr()) {
                continue;
            }
            let mut child_prefix = rel;
            child_prefix.push(b'/');
            self.collect_dir(&path, child_prefix.as_bstr())?;
        }
        Ok(())
    }

    fn load_ignore_file(&mut self, path: &Path, prefix: &BStr) -> Result<(), IndexError> {
        let content = match std::fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(IndexError::Io(e)),
        };
        for line in content.lines() {
            if let Some(pattern) = self.parse_line(line, prefix) {
                self.patterns.push(pattern);
            }
        }
        Ok(())
    }

    fn parse_line(&self, line: &[u8], prefix: &BStr) -> Option<IgnorePattern> {
        let mut line = line.strip_suffix(b"\r").unwrap_or(line);

        if line.is_empty() || line[0] == b'#' {
            return None;
        }

        // Trailing unescaped spaces are not part of the pattern.
        while line.len() > 1 && line.last() == Some(&b' ') && line[line.len() - 2] != b'\\' {
            line = &line[..line.len() - 1];
        }

        let negated = line[0] == b'!';
        if negated {
            line = &line[1..];
        }
        // `\#` and `\!` escape the special leading characters.
        if line.first() == Some(&b'\\') && matches!(line.get(1), Some(b'#') | Some(b'!')) {
            line = &line[1..];
        }

        let directory_only = line.last() == Some(&b'/');
        if directory_only {
            line = &line[..line.len() - 1];
        }

        if line.is_empty() {
            return None;
        }

        let anchored = line.contains(&b'/');
        let body = if line[0] == b'/' { &line[1..] } else { line };

        Some(IgnorePattern {
            matcher: Wildmatch::new(BStr::new(body), self.ignore_case),
            negated,
            directory_only,
            anchored,
            prefix: BString::from(prefix),
        })
    }

    /// Whether `path` (worktree-relative, `/`-separated) is ignored.
    ///
    /// `.git` and everything under it is implicitly ignored, and a file is
    /// ignored whenever any of its parent directories is.
    pub fn is_ignored(&self, path: &BStr) -> bool {
        let bytes: &[u8] = path.as_ref();
        if bytes == b".git" || bytes.starts_with(b".git/") {
            return true;
        }

        // Ancestors first: once a directory is out, its content is out.
        for (i, &b) in bytes.iter().enumerate() {
            if b == b'/' && self.matches(BStr::new(&bytes[..i]), true) {
                return true;
            }
        }
        self.matches(path, false)
    }

    /// Whether the directory `path` is ignored (for walk pruning).
    pub fn is_ignored_dir(&self, path: &BStr) -> bool {
        let bytes: &[u8] = path.as_ref();
        if bytes == b".git" || bytes.starts_with(b".git/") {
            return true;
        }
        for (i, &b) in bytes.iter().enumerate() {
            if b == b'/' && self.matches(BStr::new(&bytes[..i]), true) {
                return true;
            }
        }
        self.matches(path, true)
    }

    /// Evaluate all patterns against one exact path; last match wins.
    fn matches(&self, path: &BStr, is_dir: bool) -> bool {
        let mut ignored = false;
        for pat in &self.patterns {
            if pat.directory_only && !is_dir {
                continue;
            }
            if pattern_matches(pat, path) {
                ignored = !pat.negated;
            }
        }
        ignored
    }

    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    /// Number of loaded patterns.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

fn pattern_matches(pat: &IgnorePattern, path: &BStr) -> bool {
    let bytes: &[u8] = path.as_ref();

    // Scope to the directory holding the .gitignore.
    let rel = match bytes.strip_prefix(pat.prefix.as_slice()) {
        Some(rel) => rel,
        None => return false,
    };

    if pat.anchored {
        pat.matcher.matches(BStr::new(rel))
    } else {
        // Unanchored patterns match the basename at any depth below the
        // prefix.
        let basename = match rel.rfind_byte(b'/') {
            Some(pos) => &rel[pos + 1..],
            None => rel,
        };
        pat.matcher.matches(BStr::new(basename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn matcher_for(files: &[(&str, &str)]) -> (tempfile::TempDir, IgnoreMatcher) {
        let dir = tempfile::tempdir().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        let mut matcher = IgnoreMatcher::new(dir.path(), false);
        matcher.init().unwrap();
        (dir, matcher)
    }

    fn ignored(m: &IgnoreMatcher, path: &str) -> bool {
        m.is_ignored(BStr::new(path))
    }

    #[test]
    fn git_dir_is_implicitly_ignored() {
        let (_dir, m) = matcher_for(&[]);
        assert!(ignored(&m, ".git"));
        assert!(ignored(&m, ".git/HEAD"));
        assert!(!ignored(&m, ".github"));
    }

    #[test]
    fn basic_glob() {
        let (_dir, m) = matcher_for(&[(".gitignore", "*.log\n")]);
        assert!(ignored(&m, "debug.log"));
        assert!(ignored(&m, "sub/debug.log")); // unanchored: any depth
        assert!(!ignored(&m, "debug.txt"));
    }

    #[test]
    fn anchored_pattern_scoped_to_root() {
        let (_dir, m) = matcher_for(&[(".gitignore", "/target\nbuild/out\n")]);
        assert!(ignored(&m, "target"));
        assert!(ignored(&m, "target/debug/x")); // via ignored parent
        assert!(!ignored(&m, "sub/target"));
        assert!(ignored(&m, "build/out"));
        assert!(!ignored(&m, "other/build/out"));
    }

    #[test]
    fn directory_only_pattern() {
        let (_dir, m) = matcher_for(&[(".gitignore", "cache/\n")]);
        assert!(m.is_ignored_dir(BStr::new("cache")));
        assert!(ignored(&m, "cache/data.bin"));
        // A plain file named "cache" is not a directory.
        assert!(!ignored(&m, "cache"));
    }

    #[test]
    fn negation_reincludes() {
        let (_dir, m) = matcher_for(&[(".gitignore", "*.log\n!keep.log\n")]);
        assert!(ignored(&m, "debug.log"));
        assert!(!ignored(&m, "keep.log"));
    }

    #[test]
    fn nested_gitignore_has_prefix() {
        let (_dir, m) = matcher_for(&[
            (".gitignore", "*.tmp\n"),
            ("sub/.gitignore", "*.obj\n"),
            ("sub/keep.txt", ""),
        ]);
        assert!(ignored(&m, "sub/build.obj"));
        assert!(!ignored(&m, "build.obj")); // sub's rules don't reach the root
        assert!(ignored(&m, "sub/junk.tmp")); // root rules reach down
        assert!(!ignored(&m, "sub/keep.txt"));
    }

    #[test]
    fn gitignore_inside_ignored_dir_is_not_read() {
        let (_dir, m) = matcher_for(&[
            (".gitignore", "vendored/\n"),
            ("vendored/.gitignore", "!everything\n"),
        ]);
        assert!(ignored(&m, "vendored/everything"));
    }

    #[test]
    fn comments_and_blanks_skipped() {
        let (_dir, m) = matcher_for(&[(".gitignore", "# comment\n\n*.bak\n")]);
        assert_eq!(m.pattern_count(), 1);
        assert!(ignored(&m, "file.bak"));
    }

    #[test]
    fn escaped_hash_is_literal() {
        let (_dir, m) = matcher_for(&[(".gitignore", "\\#literal\n")]);
        assert!(ignored(&m, "#literal"));
    }

    #[test]
    fn case_insensitive_matching() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.LOG\n").unwrap();
        let mut m = IgnoreMatcher::new(dir.path(), true);
        m.init().unwrap();
        assert!(m.is_ignored(BStr::new("debug.log")));
    }
}
