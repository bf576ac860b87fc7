//! Lexical path helpers
//!
//! The output directory usually does not exist yet when paths are rewritten, so
//! nothing here touches the filesystem (no `canonicalize`).

use std::path::{Component, Path, PathBuf};

/// Resolve `path` against `base` and collapse `.` and `..` components.
///
/// An absolute `path` ignores `base`, like `Path::join` does.
pub fn resolve(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    normalize(&base.join(path))
}

/// Collapse `.` and `..` components without consulting the filesystem.
///
/// `..` at the root of an absolute path is dropped; leading `..` of a relative
/// path is kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    out.iter().map(|c| c.as_os_str()).collect()
}

/// Relative path leading from `from` to `to`.
///
/// Both paths are expected to be absolute and normalized. When they share no
/// root (different drives on Windows) there is no relative form and `to` is
/// returned as-is, which callers detect with `is_absolute()`.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from.components().collect();
    let to_parts: Vec<Component> = to.components().collect();

    if from.first() != to_parts.first() {
        return to.to_path_buf();
    }

    let common = from
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..from.len() {
        result.push("..");
    }
    for part in &to_parts[common..] {
        result.push(part.as_os_str());
    }
    result
}

/// Render a relative path with `/` separators regardless of platform.
pub fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether `path` is relative and stays below the directory it is joined to.
pub fn is_confined(path: &Path) -> bool {
    let mut has_name = false;
    for component in path.components() {
        match component {
            Component::Normal(_) => has_name = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    has_name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_confined() {
        assert!(is_confined(Path::new("src/index.ts")));
        assert!(is_confined(Path::new("./README.md")));
        assert!(is_confined(Path::new("..foo")));
        assert!(!is_confined(Path::new("../escaped.txt")));
        assert!(!is_confined(Path::new("src/../../escaped.txt")));
        assert!(!is_confined(Path::new("/etc/passwd")));
        assert!(!is_confined(Path::new("")));
        assert!(!is_confined(Path::new(".")));
    }

    #[test]
    fn test_normalize_collapses_dots() {
        assert_eq!(
            normalize(Path::new("/proj/./src/../dist/esm")),
            PathBuf::from("/proj/dist/esm")
        );
        assert_eq!(normalize(Path::new("/../etc")), PathBuf::from("/etc"));
        assert_eq!(normalize(Path::new("../a/./b")), PathBuf::from("../a/b"));
    }

    #[test]
    fn test_resolve_keeps_absolute_paths() {
        assert_eq!(
            resolve(Path::new("/proj"), "/opt/tool/cli.js"),
            PathBuf::from("/opt/tool/cli.js")
        );
        assert_eq!(
            resolve(Path::new("/proj"), "dist/cjs/index.js"),
            PathBuf::from("/proj/dist/cjs/index.js")
        );
    }

    #[test]
    fn test_relative_path_inside_and_outside() {
        let dist = Path::new("/proj/dist");
        assert_eq!(
            relative_path(dist, Path::new("/proj/dist/esm/index.js")),
            PathBuf::from("esm/index.js")
        );
        assert_eq!(
            relative_path(dist, Path::new("/proj/src/cli.ts")),
            PathBuf::from("../src/cli.ts")
        );
        assert_eq!(relative_path(dist, Path::new("/proj/dist")), PathBuf::new());
        assert_eq!(
            relative_path(dist, Path::new("/proj/distribution/a.js")),
            PathBuf::from("../distribution/a.js")
        );
    }

    #[test]
    fn test_forward_slashes() {
        let p: PathBuf = ["esm", "nested", "index.js"].iter().collect();
        assert_eq!(to_forward_slashes(&p), "esm/nested/index.js");
    }
}
