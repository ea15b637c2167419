use std::fmt;

use super::category::CategoryTag;

/// Identity of a named remote fetch whose result is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryKey {
    /// `listItems()`
    AllItems,
    /// `filterByCategory(tag)`, matched by tag only
    ByCategory(CategoryTag),
    /// `sortBooksByYear()`
    BooksSortedByYear,
}

impl QueryKey {
    /// Every key the catalog knows about.
    pub fn all() -> [QueryKey; 6] {
        [
            QueryKey::AllItems,
            QueryKey::ByCategory(CategoryTag::Book),
            QueryKey::ByCategory(CategoryTag::Patch),
            QueryKey::ByCategory(CategoryTag::Uniform),
            QueryKey::ByCategory(CategoryTag::Tin),
            QueryKey::BooksSortedByYear,
        ]
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::AllItems => f.write_str("all-items"),
            QueryKey::ByCategory(tag) => write!(f, "by-category:{tag}"),
            QueryKey::BooksSortedByYear => f.write_str("books-sorted-by-year"),
        }
    }
}
