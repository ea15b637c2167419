//! Item categories.
//!
//! A [`Category`] is a closed sum type: the variant decides the payload shape
//! and nothing crosses between variants. Every place that inspects a category
//! matches exhaustively, so a new kind of memorabilia is a compile-checked
//! change across the crate.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::CatalogError;

// ============================================================================
// Category
// ============================================================================

/// The kind of an item together with its kind-specific payload.
///
/// Equality is structural: two categories are equal when both the tag and the
/// payload match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Category {
    Tin,
    Book { name: String, year: i64 },
    Patch,
    Uniform,
}

impl Category {
    /// Build a book category.
    pub fn book(name: impl Into<String>, year: i64) -> Self {
        Category::Book {
            name: name.into(),
            year,
        }
    }

    /// Discriminator of this category.
    pub fn tag(&self) -> CategoryTag {
        match self {
            Category::Tin => CategoryTag::Tin,
            Category::Book { .. } => CategoryTag::Book,
            Category::Patch => CategoryTag::Patch,
            Category::Uniform => CategoryTag::Uniform,
        }
    }

    /// Book title, if this is a book.
    pub fn book_name(&self) -> Option<&str> {
        match self {
            Category::Book { name, .. } => Some(name),
            Category::Tin | Category::Patch | Category::Uniform => None,
        }
    }

    /// Publication year, if this is a book.
    pub fn book_year(&self) -> Option<i64> {
        match self {
            Category::Book { year, .. } => Some(*year),
            Category::Tin | Category::Patch | Category::Uniform => None,
        }
    }

    /// Argument for tag-only category filtering.
    ///
    /// The store matches on the tag alone, so the book payload here is a
    /// placeholder and must never be used for matching.
    pub fn probe(tag: CategoryTag) -> Self {
        match tag {
            CategoryTag::Tin => Category::Tin,
            CategoryTag::Book => Category::book("", 0),
            CategoryTag::Patch => Category::Patch,
            CategoryTag::Uniform => Category::Uniform,
        }
    }

    /// Human-readable label of the kind.
    pub fn label(&self) -> &'static str {
        self.tag().label()
    }
}

// ============================================================================
// CategoryTag
// ============================================================================

/// Payload-free discriminator of a [`Category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryTag {
    Tin,
    Book,
    Patch,
    Uniform,
}

impl CategoryTag {
    pub const ALL: [CategoryTag; 4] = [
        CategoryTag::Tin,
        CategoryTag::Book,
        CategoryTag::Patch,
        CategoryTag::Uniform,
    ];

    /// Stable name used in query keys and storage.
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryTag::Tin => "Tin",
            CategoryTag::Book => "Book",
            CategoryTag::Patch => "Patch",
            CategoryTag::Uniform => "Uniform",
        }
    }

    pub fn label(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryTag {
    type Err = CatalogError;

    /// Case-insensitive; accepts singular and plural forms ("book", "Books").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tin" | "tins" => Ok(CategoryTag::Tin),
            "book" | "books" => Ok(CategoryTag::Book),
            "patch" | "patches" => Ok(CategoryTag::Patch),
            "uniform" | "uniforms" => Ok(CategoryTag::Uniform),
            other => Err(CatalogError::Validation(format!(
                "unknown category '{other}' (expected book, patch, uniform or tin)"
            ))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
