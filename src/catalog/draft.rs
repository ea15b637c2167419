//! Add-item form input and its validation.
//!
//! Input arrives as raw text. Everything is checked here, before anything is
//! submitted to the store, and problems come back as
//! [`CatalogError::Validation`].
use super::category::{Category, CategoryTag};
use super::error::{CatalogError, CatalogResult};
use crate::blob::Blob;

/// Raw add-item form contents.
#[derive(Debug, Clone)]
pub struct ItemDraft {
    pub kind: CategoryTag,
    /// Book title (books only)
    pub book_name: String,
    /// Book year as typed (books only)
    pub book_year: String,
    /// Free-form id (non-books only; books derive theirs)
    pub item_id: String,
    pub photo: Option<Blob>,
}

/// A validated add-item request, ready to submit.
#[derive(Debug, Clone)]
pub struct AddItemRequest {
    pub id: String,
    pub category: Category,
    pub photo: Option<Blob>,
}

impl ItemDraft {
    pub fn new(kind: CategoryTag) -> Self {
        Self {
            kind,
            book_name: String::new(),
            book_year: String::new(),
            item_id: String::new(),
            photo: None,
        }
    }

    /// Id the draft would be stored under, as far as it can be derived.
    ///
    /// Used to label a rejected draft. Books use the year text as typed, so an
    /// invalid year still yields a recognizable id; a book without a title
    /// yields an empty id.
    pub fn intended_id(&self) -> String {
        match self.kind {
            CategoryTag::Book => {
                let name = self.book_name.trim();
                if name.is_empty() {
                    String::new()
                } else {
                    book_id(name, self.book_year.trim())
                }
            }
            CategoryTag::Patch | CategoryTag::Uniform | CategoryTag::Tin => {
                self.item_id.trim().to_string()
            }
        }
    }

    /// Validate the draft and build the request.
    ///
    /// Books need a title and an integer year and get the id
    /// `book-<title-slug>-<year>`. Other kinds need a non-blank id.
    /// Photos larger than `max_photo_bytes` are rejected.
    pub fn into_request(self, max_photo_bytes: u64) -> CatalogResult<AddItemRequest> {
        if let Some(photo) = &self.photo {
            if photo.size() > max_photo_bytes {
                return Err(CatalogError::Validation(format!(
                    "photo is {} bytes (max {} bytes)",
                    photo.size(),
                    max_photo_bytes
                )));
            }
        }

        let (id, category) = match self.kind {
            CategoryTag::Book => {
                let name = self.book_name.trim();
                if name.is_empty() {
                    return Err(CatalogError::Validation("book name is required".into()));
                }
                let year_text = self.book_year.trim();
                let year: i64 = year_text.parse().map_err(|_| {
                    CatalogError::Validation(format!("book year '{year_text}' is not a number"))
                })?;
                (book_id(name, year), Category::book(name, year))
            }
            CategoryTag::Patch | CategoryTag::Uniform | CategoryTag::Tin => {
                let id = self.item_id.trim();
                if id.is_empty() {
                    return Err(CatalogError::Validation("item id is required".into()));
                }
                (id.to_string(), Category::probe(self.kind))
            }
        };

        Ok(AddItemRequest {
            id,
            category,
            photo: self.photo,
        })
    }
}

/// `book-<lowercased title, whitespace runs as '-'>-<year>`
fn book_id(name: &str, year: impl std::fmt::Display) -> String {
    let slug = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    format!("book-{slug}-{year}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_draft(name: &str, year: &str) -> ItemDraft {
        ItemDraft {
            book_name: name.to_string(),
            book_year: year.to_string(),
            ..ItemDraft::new(CategoryTag::Book)
        }
    }

    #[test]
    fn test_book_request_derives_id() {
        let request = book_draft("  Brownie   Scout Handbook ", "1986")
            .into_request(1024)
            .unwrap();

        assert_eq!(request.id, "book-brownie-scout-handbook-1986");
        assert_eq!(request.category, Category::book("Brownie   Scout Handbook", 1986));
    }

    #[test]
    fn test_non_numeric_year_rejected() {
        let err = book_draft("Handbook", "nineteen").into_request(1024).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(msg) if msg.contains("nineteen")));
    }

    #[test]
    fn test_book_name_required() {
        let err = book_draft("   ", "1990").into_request(1024).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn test_non_book_uses_trimmed_id() {
        let draft = ItemDraft {
            item_id: "  tin-cookie-2020 ".to_string(),
            ..ItemDraft::new(CategoryTag::Tin)
        };
        let request = draft.into_request(1024).unwrap();
        assert_eq!(request.id, "tin-cookie-2020");
        assert_eq!(request.category, Category::Tin);
    }

    #[test]
    fn test_non_book_id_required() {
        let err = ItemDraft::new(CategoryTag::Patch)
            .into_request(1024)
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn test_intended_id() {
        assert_eq!(book_draft(" Camp Songs ", "1960").intended_id(), "book-camp-songs-1960");
        assert_eq!(book_draft("Handbook", "19x0").intended_id(), "book-handbook-19x0");
        assert_eq!(book_draft("  ", "1990").intended_id(), "");

        let draft = ItemDraft {
            item_id: " patch-owl ".to_string(),
            ..ItemDraft::new(CategoryTag::Patch)
        };
        assert_eq!(draft.intended_id(), "patch-owl");
    }

    #[test]
    fn test_oversized_photo_rejected() {
        let draft = ItemDraft {
            item_id: "uniform-vest".to_string(),
            photo: Some(Blob::from_bytes(vec![0u8; 16])),
            ..ItemDraft::new(CategoryTag::Uniform)
        };
        let err = draft.into_request(8).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(msg) if msg.contains("16 bytes")));
    }
}
