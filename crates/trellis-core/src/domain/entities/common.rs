use super::DomainError;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A filesystem path guaranteed to be relative.
///
/// Invariant: never absolute. Enforced at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelativePath(PathBuf);

impl RelativePath {
    /// The current directory, `.`.
    pub fn current() -> Self {
        Self(PathBuf::from("."))
    }

    /// Fallible constructor.
    pub fn try_new(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();
        if path.is_absolute() || path.has_root() {
            Err(DomainError::AbsolutePathNotAllowed {
                path: path.display().to_string(),
            })
        } else {
            Ok(Self(path))
        }
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl Default for RelativePath {
    fn default() -> Self {
        Self::current()
    }
}

impl AsRef<Path> for RelativePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Lexically normalise a path: drop `.` segments and fold `name/..` pairs.
///
/// No filesystem access and no symlink resolution. Leading `..` segments of
/// a relative path are kept; `..` directly under the root is dropped.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Join `relative` onto `base` and return the normalised result, or `None`
/// when it would land outside `base`.
pub fn resolve_within(base: &Path, relative: &Path) -> Option<PathBuf> {
    let base = normalize(base);
    let joined = normalize(&base.join(relative));

    if base == Path::new(".") {
        // A relative base: anything that does not climb out is inside.
        let escapes = joined.is_absolute()
            || joined
                .components()
                .next()
                .is_some_and(|c| matches!(c, Component::ParentDir));
        return (!escapes).then_some(joined);
    }

    joined.starts_with(&base).then_some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_rejects_absolute() {
        assert!(RelativePath::try_new("sub/dir").is_ok());
        assert!(matches!(
            RelativePath::try_new("/etc"),
            Err(DomainError::AbsolutePathNotAllowed { .. })
        ));
    }

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize(Path::new("/out/x/..")), PathBuf::from("/out"));
        assert_eq!(normalize(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn resolve_within_contains_paths() {
        let base = Path::new("/out");
        assert_eq!(
            resolve_within(base, Path::new("src/main.rs")),
            Some(PathBuf::from("/out/src/main.rs"))
        );
        assert_eq!(
            resolve_within(base, Path::new("src/../README.md")),
            Some(PathBuf::from("/out/README.md"))
        );
        assert_eq!(resolve_within(base, Path::new("../evil.txt")), None);
        assert_eq!(resolve_within(base, Path::new("/etc/passwd")), None);
    }

    #[test]
    fn sibling_prefix_is_not_inside() {
        assert_eq!(resolve_within(Path::new("/out"), Path::new("../outside/x")), None);
    }

    #[test]
    fn relative_base() {
        assert_eq!(
            resolve_within(Path::new("."), Path::new("a/b")),
            Some(PathBuf::from("a/b"))
        );
        assert_eq!(resolve_within(Path::new("."), Path::new("../a")), None);
        assert_eq!(
            resolve_within(Path::new("proj"), Path::new("../proj2/a")),
            None
        );
    }
}
