// 🪞 Mirror fallback - Prefer a remote listing, always fall back to local data
//
// The decorator never changes the local semantics: any remote failure (or a
// remote record that does not match the requested ISBN) resolves exactly like
// the plain `Catalog` would. Review maps always come from the local catalog,
// since that is where reviews are written.

use anyhow::Context as AnyhowContext;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};

use crate::catalog::{BookRecord, Catalog};
use crate::error::{CatalogError, Result};

/// Alternate source of catalog listings
pub trait RemoteCatalog: Send + Sync {
    fn fetch_all(&self) -> anyhow::Result<Vec<BookRecord>>;

    fn fetch_by_id(&self, isbn: &str) -> anyhow::Result<Option<BookRecord>>;
}

/// Read access to the local catalog.
///
/// Lets the decorator take the lock only after the remote has answered.
pub trait LocalCatalog {
    fn with_catalog<R>(&self, f: impl FnOnce(&Catalog) -> R) -> R;
}

impl LocalCatalog for Catalog {
    fn with_catalog<R>(&self, f: impl FnOnce(&Catalog) -> R) -> R {
        f(self)
    }
}

impl LocalCatalog for RwLock<Catalog> {
    fn with_catalog<R>(&self, f: impl FnOnce(&Catalog) -> R) -> R {
        let catalog = self.read().unwrap_or_else(PoisonError::into_inner);
        f(&catalog)
    }
}

// ============================================================================
// DECORATOR
// ============================================================================

pub struct MirroredCatalog<'a, L: LocalCatalog> {
    local: &'a L,
    remote: Option<&'a dyn RemoteCatalog>,
}

impl<'a, L: LocalCatalog> MirroredCatalog<'a, L> {
    pub fn new(local: &'a L, remote: Option<&'a dyn RemoteCatalog>) -> Self {
        MirroredCatalog { local, remote }
    }

    pub fn get_all(&self) -> Vec<BookRecord> {
        if let Some(remote) = self.remote {
            match remote.fetch_all() {
                Ok(books) => {
                    debug!(count = books.len(), "serving listing from mirror");
                    return self
                        .local
                        .with_catalog(|catalog| books.into_iter().map(|b| overlay(catalog, b)).collect());
                }
                Err(e) => warn!(error = %e, "mirror listing failed, using local catalog"),
            }
        }
        self.local.with_catalog(Catalog::get_all)
    }

    pub fn get_by_id(&self, isbn: &str) -> Result<BookRecord> {
        if isbn.is_empty() {
            return Err(CatalogError::NotFound("empty ISBN".to_string()));
        }

        if let Some(remote) = self.remote {
            match remote.fetch_by_id(isbn) {
                Ok(Some(book)) if book.isbn == isbn => {
                    return Ok(self.local.with_catalog(|catalog| overlay(catalog, book)));
                }
                Ok(Some(book)) => {
                    warn!(requested = isbn, returned = %book.isbn, "mirror returned wrong book")
                }
                Ok(None) => debug!(isbn, "book not on mirror"),
                Err(e) => warn!(isbn, error = %e, "mirror lookup failed, using local catalog"),
            }
        }
        self.local.with_catalog(|catalog| catalog.get_by_id(isbn))
    }
}

/// Replace a remote record's reviews with the local ones when the book is
/// also held locally
fn overlay(catalog: &Catalog, mut book: BookRecord) -> BookRecord {
    if let Ok(reviews) = catalog.get_reviews(&book.isbn) {
        book.reviews = reviews;
    }
    book
}

// ============================================================================
// SNAPSHOT MIRROR
// ============================================================================

/// Mirror backed by a seed-format JSON snapshot, re-read on every call so an
/// external sync job can replace it while the server runs.
pub struct SnapshotMirror {
    path: PathBuf,
}

impl SnapshotMirror {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        SnapshotMirror {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Snapshots go through the same seed checks as the local catalog
    fn load(&self) -> anyhow::Result<Catalog> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read mirror snapshot: {:?}", self.path))?;
        Catalog::from_json_str(&content)
            .with_context(|| format!("Invalid mirror snapshot: {:?}", self.path))
    }
}

impl RemoteCatalog for SnapshotMirror {
    fn fetch_all(&self) -> anyhow::Result<Vec<BookRecord>> {
        Ok(self.load()?.get_all())
    }

    fn fetch_by_id(&self, isbn: &str) -> anyhow::Result<Option<BookRecord>> {
        Ok(self.load()?.get_by_id(isbn).ok())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::io::Write;

    struct Unreachable;

    impl RemoteCatalog for Unreachable {
        fn fetch_all(&self) -> anyhow::Result<Vec<BookRecord>> {
            Err(anyhow!("connection refused"))
        }

        fn fetch_by_id(&self, _isbn: &str) -> anyhow::Result<Option<BookRecord>> {
            Err(anyhow!("connection refused"))
        }
    }

    /// Answers every lookup with the same book
    struct Confused;

    impl RemoteCatalog for Confused {
        fn fetch_all(&self) -> anyhow::Result<Vec<BookRecord>> {
            Ok(vec![])
        }

        fn fetch_by_id(&self, _isbn: &str) -> anyhow::Result<Option<BookRecord>> {
            Ok(Some(BookRecord::new("7", "Someone", "Something")))
        }
    }

    fn local() -> Catalog {
        Catalog::from_records(vec![
            BookRecord::new("1", "Chinua Achebe", "Things Fall Apart"),
            BookRecord::new("2", "Jane Austen", "Emma"),
        ])
        .unwrap()
    }

    fn snapshot(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_no_remote_uses_local() {
        let catalog = local();
        let mirrored = MirroredCatalog::new(&catalog, None);

        assert_eq!(mirrored.get_all(), catalog.get_all());
        assert_eq!(mirrored.get_by_id("2").unwrap().title, "Emma");
        assert!(mirrored.get_by_id("3").is_err());
    }

    #[test]
    fn test_failing_remote_falls_back() {
        let catalog = local();
        let remote = Unreachable;
        let mirrored = MirroredCatalog::new(&catalog, Some(&remote));

        assert_eq!(mirrored.get_all(), catalog.get_all());
        assert_eq!(mirrored.get_by_id("1").unwrap(), catalog.get_by_id("1").unwrap());
        assert!(matches!(mirrored.get_by_id(""), Err(CatalogError::NotFound(_))));
        assert!(matches!(mirrored.get_by_id("9"), Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_mismatched_remote_record_ignored() {
        let catalog = local();
        let remote = Confused;
        let mirrored = MirroredCatalog::new(&catalog, Some(&remote));

        assert_eq!(mirrored.get_by_id("1").unwrap().isbn, "1");
        assert!(mirrored.get_by_id("9").is_err());
    }

    #[test]
    fn test_snapshot_mirror_preferred_when_readable() {
        let file = snapshot(
            r#"{"1":{"author":"Chinua Achebe","title":"Things Fall Apart (Mirror Edition)","reviews":{}},
                "3":{"author":"Mary Shelley","title":"Frankenstein","reviews":{"ada":"Classic"}}}"#,
        );

        let catalog = local();
        let remote = SnapshotMirror::new(file.path());
        let mirrored = MirroredCatalog::new(&catalog, Some(&remote));

        let all = mirrored.get_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Things Fall Apart (Mirror Edition)");

        // Only on the mirror, so its reviews are kept
        let only_remote = mirrored.get_by_id("3").unwrap();
        assert_eq!(only_remote.reviews.get("ada").map(String::as_str), Some("Classic"));

        // Absent from the mirror, served locally
        assert_eq!(mirrored.get_by_id("2").unwrap().title, "Emma");
    }

    #[test]
    fn test_local_reviews_override_mirror_copy() {
        let file = snapshot(
            r#"{"1":{"author":"Chinua Achebe","title":"Things Fall Apart","reviews":{"stale":"Old copy"}}}"#,
        );

        let lock = RwLock::new(local());
        lock.write().unwrap().put_review("1", "alice", "Great").unwrap();

        let remote = SnapshotMirror::new(file.path());
        let mirrored = MirroredCatalog::new(&lock, Some(&remote));

        let book = mirrored.get_by_id("1").unwrap();
        assert_eq!(book.reviews.len(), 1);
        assert_eq!(book.reviews.get("alice").map(String::as_str), Some("Great"));

        let all = mirrored.get_all();
        assert_eq!(all[0].reviews, book.reviews);
    }

    #[test]
    fn test_invalid_snapshot_rejected() {
        let empty_key = snapshot(
            r#"{"1":{"author":"A","title":"B","reviews":{}},"":{"author":"C","title":"D","reviews":{}}}"#,
        );
        let remote = SnapshotMirror::new(empty_key.path());
        assert!(remote.fetch_all().is_err());

        let catalog = local();
        let mirrored = MirroredCatalog::new(&catalog, Some(&remote));
        let isbns: Vec<String> = mirrored.get_all().into_iter().map(|b| b.isbn).collect();
        assert_eq!(isbns, vec!["1", "2"]);
    }

    #[test]
    fn test_snapshot_mirror_missing_file() {
        let remote = SnapshotMirror::new("/nonexistent/snapshot.json");
        assert!(remote.fetch_all().is_err());

        let catalog = local();
        let mirrored = MirroredCatalog::new(&catalog, Some(&remote));
        assert_eq!(mirrored.get_all().len(), 2);
    }
}
