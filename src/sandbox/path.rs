//! Lexical path resolution for containment checks.

use std::path::{Component, Path, PathBuf};

/// Make `path` absolute against `base` and collapse `.` and `..` lexically.
///
/// Works for paths that do not exist. `..` at the filesystem root stays at
/// the root.
pub fn normalize(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() { path.to_path_buf() } else { base.join(path) };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Resolve symlinks in the deepest existing ancestor of an absolute,
/// normalized path and re-append the rest.
pub fn resolve_existing(path: &Path) -> Option<PathBuf> {
    for ancestor in path.ancestors() {
        if let Ok(real) = ancestor.canonicalize() {
            let rest = path.strip_prefix(ancestor).ok()?;
            return Some(if rest.as_os_str().is_empty() { real } else { real.join(rest) });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_absolute_untouched() {
        let base = Path::new("/work/project");
        assert_eq!(normalize(Path::new("/etc/passwd"), base), PathBuf::from("/etc/passwd"));
    }

    #[test]
    fn test_normalize_relative_joins_base() {
        let base = Path::new("/work/project");
        assert_eq!(normalize(Path::new("src/main.rs"), base), PathBuf::from("/work/project/src/main.rs"));
    }

    #[test]
    fn test_normalize_collapses_dots() {
        let base = Path::new("/work/project");
        assert_eq!(normalize(Path::new("./src/../lib/./x.rs"), base), PathBuf::from("/work/project/lib/x.rs"));
    }

    #[test]
    fn test_normalize_traversal_escapes() {
        let base = Path::new("/work/project");
        assert_eq!(normalize(Path::new("../../etc/passwd"), base), PathBuf::from("/etc/passwd"));
        assert_eq!(normalize(Path::new("/work/project/../other"), base), PathBuf::from("/work/other"));
    }

    #[test]
    fn test_normalize_parent_of_root_is_root() {
        let base = Path::new("/");
        assert_eq!(normalize(Path::new("../../.."), base), PathBuf::from("/"));
    }

    #[test]
    fn test_resolve_existing_missing_tail() {
        let temp = tempfile::TempDir::new().unwrap();
        let real = temp.path().canonicalize().unwrap();
        let path = temp.path().join("not").join("there.txt");
        assert_eq!(resolve_existing(&path), Some(real.join("not").join("there.txt")));
    }
}
