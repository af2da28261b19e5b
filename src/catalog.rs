// 📚 Catalog Store - Books keyed by ISBN
//
// The catalog is seeded once at startup and never gains or loses books.
// The only mutation is the per-book review map (reviewer → text).

use anyhow::{bail, Context as AnyhowContext};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{CatalogError, Result};

/// Reviewer-key → review text
pub type Reviews = BTreeMap<String, String>;

/// Default seed shipped with the binary
pub const DEFAULT_SEED: &str = include_str!("../data/books.json");

// ============================================================================
// BOOK RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Catalog key (immutable once seeded)
    pub isbn: String,

    pub author: String,

    pub title: String,

    /// One review per reviewer
    #[serde(default)]
    pub reviews: Reviews,
}

/// Seed entry: the ISBN is carried by the enclosing object key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedBook {
    pub author: String,
    pub title: String,
    #[serde(default)]
    pub reviews: Reviews,
}

impl BookRecord {
    pub fn new(isbn: impl Into<String>, author: impl Into<String>, title: impl Into<String>) -> Self {
        BookRecord {
            isbn: isbn.into(),
            author: author.into(),
            title: title.into(),
            reviews: Reviews::new(),
        }
    }

    /// Attach reviews (builder style, used by seeds and tests)
    pub fn with_review(mut self, reviewer: impl Into<String>, text: impl Into<String>) -> Self {
        self.reviews.insert(reviewer.into(), text.into());
        self
    }

    /// Strip the ISBN back off for the seed/listing format
    pub fn to_seed(&self) -> SeedBook {
        SeedBook {
            author: self.author.clone(),
            title: self.title.clone(),
            reviews: self.reviews.clone(),
        }
    }
}

// ============================================================================
// SEED PARSING
// ============================================================================

/// Parse the seed format `{ "<isbn>": { author, title, reviews } }`,
/// keeping document order.
pub fn parse_seed(content: &str) -> anyhow::Result<Vec<BookRecord>> {
    let seed: IndexMap<String, SeedBook> =
        serde_json::from_str(content).context("Failed to parse catalog seed JSON")?;

    Ok(seed
        .into_iter()
        .map(|(isbn, book)| BookRecord {
            isbn,
            author: book.author,
            title: book.title,
            reviews: book.reviews,
        })
        .collect())
}

// ============================================================================
// CATALOG
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    books: IndexMap<String, BookRecord>,
}

impl Catalog {
    /// Build a catalog, rejecting empty and duplicate ISBNs
    pub fn from_records(records: Vec<BookRecord>) -> anyhow::Result<Self> {
        let mut books = IndexMap::with_capacity(records.len());

        for record in records {
            if record.isbn.is_empty() {
                bail!("Seed contains a book with an empty ISBN ({:?})", record.title);
            }
            if books.contains_key(&record.isbn) {
                bail!("Seed contains duplicate ISBN: {}", record.isbn);
            }
            books.insert(record.isbn.clone(), record);
        }

        Ok(Catalog { books })
    }

    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        Catalog::from_records(parse_seed(content)?)
    }

    /// Load the seed from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read catalog seed: {:?}", path.as_ref()))?;

        Catalog::from_json_str(&content)
    }

    /// Catalog built from the embedded `data/books.json`
    pub fn seeded() -> anyhow::Result<Self> {
        Catalog::from_json_str(DEFAULT_SEED)
    }

    /// Every record, in insertion order
    pub fn get_all(&self) -> Vec<BookRecord> {
        self.books.values().cloned().collect()
    }

    pub fn get_by_id(&self, isbn: &str) -> Result<BookRecord> {
        self.book(isbn).cloned()
    }

    /// Exact author match after lowercase folding
    pub fn find_by_author(&self, author: &str) -> Vec<BookRecord> {
        let wanted = author.to_lowercase();
        self.scan(|book| book.author.to_lowercase() == wanted)
    }

    /// Exact title match after lowercase folding
    pub fn find_by_title(&self, title: &str) -> Vec<BookRecord> {
        let wanted = title.to_lowercase();
        self.scan(|book| book.title.to_lowercase() == wanted)
    }

    /// Review map of a book; empty map is a valid answer
    pub fn get_reviews(&self, isbn: &str) -> Result<Reviews> {
        self.book(isbn).map(|book| book.reviews.clone())
    }

    /// Insert or replace `reviewer`'s review, returning the previous text
    pub fn put_review(&mut self, isbn: &str, reviewer: &str, text: &str) -> Result<Option<String>> {
        if reviewer.is_empty() {
            return Err(CatalogError::InvalidInput("reviewer is required".to_string()));
        }
        if text.is_empty() {
            return Err(CatalogError::InvalidInput("review text is required".to_string()));
        }

        let book = self.book_mut(isbn)?;
        Ok(book.reviews.insert(reviewer.to_string(), text.to_string()))
    }

    /// Remove `reviewer`'s review, returning its text
    pub fn remove_review(&mut self, isbn: &str, reviewer: &str) -> Result<String> {
        let book = self.book_mut(isbn)?;
        book.reviews.remove(reviewer).ok_or_else(|| {
            CatalogError::NotFound(format!("no review by {:?} for book {}", reviewer, isbn))
        })
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    fn book(&self, isbn: &str) -> Result<&BookRecord> {
        if isbn.is_empty() {
            return Err(CatalogError::NotFound("empty ISBN".to_string()));
        }
        self.books
            .get(isbn)
            .ok_or_else(|| CatalogError::NotFound(format!("book {}", isbn)))
    }

    fn book_mut(&mut self, isbn: &str) -> Result<&mut BookRecord> {
        if isbn.is_empty() {
            return Err(CatalogError::NotFound("empty ISBN".to_string()));
        }
        self.books
            .get_mut(isbn)
            .ok_or_else(|| CatalogError::NotFound(format!("book {}", isbn)))
    }

    fn scan<F>(&self, predicate: F) -> Vec<BookRecord>
    where
        F: Fn(&BookRecord) -> bool,
    {
        self.books.values().filter(|book| predicate(book)).cloned().collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
