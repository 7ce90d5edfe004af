//! File collection for review runs.
//!
//! Walks a project root recursively and returns every file whose name ends
//! with one of the allowed extensions. Files that are not valid UTF-8 are
//! decoded lossily rather than failing the collection. The returned order
//! is traversal order sorted by path, and it is the order used to assign
//! sequence ids.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

use crate::models::ReviewableFile;

/// Fatal collection failure: the root itself is unusable.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("project root does not exist: {0}")]
    MissingRoot(String),
    #[error("project root is not a directory: {0}")]
    NotADirectory(String),
    #[error("failed to walk project tree: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] globset::Error),
}

/// Collect the reviewable files under `root`.
///
/// A file is included iff its name ends with one of `extensions`
/// (case-sensitive suffix match). Entries under `.git`, `target`, and
/// `node_modules` are always skipped — a freshly cloned repository carries
/// its `.git` directory.
pub fn collect(root: &Path, extensions: &[String]) -> Result<Vec<ReviewableFile>, CollectionError> {
    if !root.exists() {
        return Err(CollectionError::MissingRoot(root.display().to_string()));
    }
    if !root.is_dir() {
        return Err(CollectionError::NotADirectory(root.display().to_string()));
    }

    let exclude_set = default_excludes()?;

    let mut files = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
            continue;
        }

        // Lossy decode: unreadable byte sequences are replaced, never fatal.
        let content = match std::fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => String::new(),
        };

        files.push(ReviewableFile {
            path: path.to_path_buf(),
            content,
        });
    }

    // Sort for deterministic ordering; sequence ids follow this order.
    files.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(files)
}

fn default_excludes() -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in ["**/.git/**", "**/target/**", "**/node_modules/**"] {
        builder.add(Glob::new(pattern)?);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn collects_only_allowed_extensions() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("A.py"), "print(1)").unwrap();
        fs::write(tmp.path().join("B.txt"), "notes").unwrap();
        fs::write(tmp.path().join("C.java"), "").unwrap();

        let files = collect(tmp.path(), &exts(&[".py", ".java"])).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["A.py", "C.java"]);
    }

    #[test]
    fn empty_file_included_with_empty_content() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("empty.py"), "").unwrap();

        let files = collect(tmp.path(), &exts(&[".py"])).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].content, "");
    }

    #[test]
    fn recurses_into_nested_directories() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a").join("b").join("c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("deep.py"), "x = 1").unwrap();
        fs::write(tmp.path().join("top.py"), "y = 2").unwrap();

        let files = collect(tmp.path(), &exts(&[".py"])).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn skips_git_directory() {
        let tmp = TempDir::new().unwrap();
        let git = tmp.path().join(".git").join("hooks");
        fs::create_dir_all(&git).unwrap();
        fs::write(git.join("hook.py"), "ignored").unwrap();
        fs::write(tmp.path().join("real.py"), "kept").unwrap();

        let files = collect(tmp.path(), &exts(&[".py"])).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("real.py"));
    }

    #[test]
    fn suffix_match_is_case_sensitive() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Upper.PY"), "x").unwrap();
        fs::write(tmp.path().join("lower.py"), "y").unwrap();

        let files = collect(tmp.path(), &exts(&[".py"])).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn invalid_utf8_decoded_lossily() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bin.py"), [0x66, 0x6f, 0xff, 0x6f]).unwrap();

        let files = collect(tmp.path(), &exts(&[".py"])).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].content.contains('\u{FFFD}'));
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = collect(Path::new("/no/such/dir"), &exts(&[".py"])).unwrap_err();
        assert!(matches!(err, CollectionError::MissingRoot(_)));
    }

    #[test]
    fn file_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("single.py");
        fs::write(&file, "x").unwrap();
        let err = collect(&file, &exts(&[".py"])).unwrap_err();
        assert!(matches!(err, CollectionError::NotADirectory(_)));
    }

    #[test]
    fn ordering_is_stable_across_calls() {
        let tmp = TempDir::new().unwrap();
        for name in ["z.py", "a.py", "m.py"] {
            fs::write(tmp.path().join(name), "x").unwrap();
        }

        let first = collect(tmp.path(), &exts(&[".py"])).unwrap();
        let second = collect(tmp.path(), &exts(&[".py"])).unwrap();
        let order = |fs: &[ReviewableFile]| -> Vec<String> {
            fs.iter()
                .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
                .collect()
        };
        assert_eq!(order(&first), order(&second));
        assert_eq!(order(&first), vec!["a.py", "m.py", "z.py"]);
    }
}
