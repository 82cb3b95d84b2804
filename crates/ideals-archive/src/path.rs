//! Virtual path codec for entries inside (possibly nested) archives.
//!
//! A virtual path is a storage path followed by zero or more archive entry
//! segments, each introduced by [`ARCHIVE_SEPARATOR`]:
//!
//! ```text
//! /libs/outer.jar!lib/inner.jar!/pkg/Class.java
//! └──── base ───┘ └──────────── inner ────────┘
//! ```
//!
//! Splitting is purely syntactic and never touches storage.

use std::borrow::Borrow;
use std::fmt;
use std::path::Component;

use camino::Utf8Path;
use camino::Utf8PathBuf;

/// Separates an archive from the path of an entry inside it.
pub const ARCHIVE_SEPARATOR: char = '!';

/// Separates segments of an entry path inside an archive.
pub const PATH_SEPARATOR: char = '/';

/// Split `path` at the first [`ARCHIVE_SEPARATOR`].
///
/// Returns `(base, inner)`. Without a separator the whole string is the base
/// and `inner` is empty.
#[must_use]
pub fn split(path: &str) -> (&str, &str) {
    path.split_once(ARCHIVE_SEPARATOR).unwrap_or((path, ""))
}

/// Split `path` at the last [`ARCHIVE_SEPARATOR`].
///
/// The left side addresses the archive that directly owns the entry named by
/// the right side: the owner of `a.jar!lib.jar!pkg/C.java` is `a.jar!lib.jar`.
#[must_use]
pub fn split_owner(path: &str) -> (&str, &str) {
    path.rsplit_once(ARCHIVE_SEPARATOR).unwrap_or((path, ""))
}

/// Strip every leading [`PATH_SEPARATOR`] so `/a/b.txt` and `a/b.txt` look up
/// the same entry.
#[must_use]
pub fn trim_leading_separators(path: &str) -> &str {
    path.trim_start_matches(PATH_SEPARATOR)
}

/// An opaque path that addresses a storage object or an entry inside one or
/// more nested archives.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualPath(String);

impl VirtualPath {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// See [`split`].
    #[must_use]
    pub fn split(&self) -> (&str, &str) {
        split(&self.0)
    }

    /// The archive owning this entry and the entry name inside it, or `None`
    /// when the path addresses a plain storage object.
    #[must_use]
    pub fn owner(&self) -> Option<(VirtualPath, &str)> {
        let (owner, entry) = split_owner(&self.0);
        if owner.len() == self.0.len() {
            None
        } else {
            Some((VirtualPath::from(owner), entry))
        }
    }

    /// The storage path this virtual path starts from.
    #[must_use]
    pub fn storage_path(&self) -> &Utf8Path {
        Utf8Path::new(self.split().0)
    }

    /// Whether the path addresses an entry inside an archive.
    #[must_use]
    pub fn is_entry(&self) -> bool {
        !self.split().1.is_empty()
    }

    /// Number of segments: one for a plain storage path, plus one per archive
    /// level traversed.
    #[must_use]
    pub fn levels(&self) -> usize {
        self.0.matches(ARCHIVE_SEPARATOR).count() + 1
    }

    /// Lexically canonical form used as an archive cache key.
    ///
    /// The storage segment is cleaned of `.` and `..` components. Inner
    /// segments lose leading and duplicate `/`, and empty segments (`!!`) are
    /// dropped. Case is preserved.
    #[must_use]
    pub fn canonical(&self) -> VirtualPath {
        let mut segments = self.0.split(ARCHIVE_SEPARATOR);
        let base = segments.next().unwrap_or_default();

        let mut out = if base.is_empty() {
            String::new()
        } else {
            clean_storage_path(Utf8Path::new(base)).into_string()
        };

        for segment in segments {
            let inner = normalize_inner(segment);
            if inner.is_empty() {
                continue;
            }
            out.push(ARCHIVE_SEPARATOR);
            out.push_str(&inner);
        }

        VirtualPath(out)
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VirtualPath {
    fn from(path: &str) -> Self {
        Self(path.to_string())
    }
}

impl From<String> for VirtualPath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

impl AsRef<str> for VirtualPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for VirtualPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

fn normalize_inner(segment: &str) -> String {
    segment
        .split(PATH_SEPARATOR)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn clean_storage_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Vec::new();

    for comp in path.as_std_path().components() {
        match comp {
            Component::CurDir => (),
            Component::ParentDir => match out.last() {
                Some(Component::RootDir) => (),
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                None | Some(Component::CurDir | Component::ParentDir | Component::Prefix(_)) => {
                    out.push(comp);
                }
            },
            comp => out.push(comp),
        }
    }

    if out.is_empty() {
        return Utf8PathBuf::from(".");
    }

    let cleaned: std::path::PathBuf = out.iter().collect();
    // Components of a UTF-8 path reassemble into UTF-8.
    Utf8PathBuf::from_path_buf(cleaned).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod splitting {
        use super::*;

        #[test]
        fn test_split_without_separator() {
            for p in ["", "/libs/a.jar", "relative/file.txt", "///"] {
                assert_eq!(split(p), (p, ""));
            }
        }

        #[test]
        fn test_split_uses_first_separator() {
            assert_eq!(
                split("/a.jar!lib.jar!pkg/C.txt"),
                ("/a.jar", "lib.jar!pkg/C.txt")
            );
            assert_eq!(split("a.jar!/x"), ("a.jar", "/x"));
        }

        #[test]
        fn test_split_trailing_separator() {
            assert_eq!(split("a.jar!"), ("a.jar", ""));
        }

        #[test]
        fn test_split_owner_uses_last_separator() {
            assert_eq!(
                split_owner("/a.jar!lib.jar!pkg/C.txt"),
                ("/a.jar!lib.jar", "pkg/C.txt")
            );
            assert_eq!(split_owner("/a.jar"), ("/a.jar", ""));
        }
    }

    mod trimming {
        use super::*;

        #[test]
        fn test_trim_leading_separators() {
            assert_eq!(trim_leading_separators("/a/b.txt"), "a/b.txt");
            assert_eq!(trim_leading_separators("///a/b.txt"), "a/b.txt");
            assert_eq!(trim_leading_separators("a/b.txt"), "a/b.txt");
            assert_eq!(trim_leading_separators("a/b/"), "a/b/");
            assert_eq!(trim_leading_separators(""), "");
        }

        #[test]
        fn test_trim_is_idempotent() {
            for p in ["", "/", "//x", "x//", "/a/b", "a!/b"] {
                let once = trim_leading_separators(p);
                assert_eq!(trim_leading_separators(once), once);
            }
        }
    }

    mod virtual_path {
        use super::*;

        #[test]
        fn test_owner() {
            let path = VirtualPath::from("/a.jar!lib.jar!pkg/C.txt");
            let (owner, entry) = path.owner().unwrap();
            assert_eq!(owner.as_str(), "/a.jar!lib.jar");
            assert_eq!(entry, "pkg/C.txt");

            assert!(VirtualPath::from("/a.jar").owner().is_none());
        }

        #[test]
        fn test_is_entry_and_levels() {
            assert!(!VirtualPath::from("/a.jar").is_entry());
            assert!(VirtualPath::from("/a.jar!x").is_entry());
            assert_eq!(VirtualPath::from("/a.jar").levels(), 1);
            assert_eq!(VirtualPath::from("/a.jar!b.jar!c").levels(), 3);
        }

        #[test]
        fn test_storage_path() {
            let path = VirtualPath::from("/libs/a.jar!x/y");
            assert_eq!(path.storage_path(), Utf8Path::new("/libs/a.jar"));
        }
    }

    mod canonical {
        use super::*;

        #[test]
        fn test_cleans_storage_segment() {
            let path = VirtualPath::from("/libs/./sub/../a.jar!lib.jar");
            assert_eq!(path.canonical().as_str(), "/libs/a.jar!lib.jar");
        }

        #[test]
        fn test_normalizes_inner_segments() {
            let path = VirtualPath::from("/a.jar!//lib//inner.jar!/pkg/C.txt");
            assert_eq!(path.canonical().as_str(), "/a.jar!lib/inner.jar!pkg/C.txt");
        }

        #[test]
        fn test_drops_empty_segments() {
            assert_eq!(VirtualPath::from("/a.jar!!x").canonical().as_str(), "/a.jar!x");
            assert_eq!(VirtualPath::from("/a.jar!").canonical().as_str(), "/a.jar");
        }

        #[test]
        fn test_preserves_case() {
            let path = VirtualPath::from("/Libs/A.JAR!Pkg/C.txt");
            assert_eq!(path.canonical(), path);
        }

        #[test]
        fn test_is_idempotent() {
            let path = VirtualPath::from("./x/../a.jar!/b//c.jar!d");
            let once = path.canonical();
            assert_eq!(once.canonical(), once);
        }
    }
}
