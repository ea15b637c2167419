//! User-controlled view state: category tab, search text and sort mode.
//!
//! Pure state container. Changing the tab never fetches anything by itself;
//! it only selects which cached query result feeds the display pipeline.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::category::CategoryTag;
use super::error::CatalogError;
use super::query::QueryKey;

// ============================================================================
// Sort Mode
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    #[default]
    Newest,
    Oldest,
    YearAsc,
    YearDesc,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Newest => "newest",
            SortMode::Oldest => "oldest",
            SortMode::YearAsc => "year-asc",
            SortMode::YearDesc => "year-desc",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortMode::Newest),
            "oldest" => Ok(SortMode::Oldest),
            "year-asc" => Ok(SortMode::YearAsc),
            "year-desc" => Ok(SortMode::YearDesc),
            other => Err(CatalogError::Validation(format!(
                "unknown sort mode '{other}' (expected newest, oldest, year-asc or year-desc)"
            ))),
        }
    }
}

// ============================================================================
// Category Tab
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryTab {
    #[default]
    All,
    Books,
    Patches,
    Uniforms,
    Tins,
}

impl CategoryTab {
    /// Cached query whose result is the base collection for this tab.
    pub fn query_key(self) -> QueryKey {
        match self.tag() {
            Some(tag) => QueryKey::ByCategory(tag),
            None => QueryKey::AllItems,
        }
    }

    /// Category shown by this tab, `None` for the all-items tab.
    pub fn tag(self) -> Option<CategoryTag> {
        match self {
            CategoryTab::All => None,
            CategoryTab::Books => Some(CategoryTag::Book),
            CategoryTab::Patches => Some(CategoryTag::Patch),
            CategoryTab::Uniforms => Some(CategoryTag::Uniform),
            CategoryTab::Tins => Some(CategoryTag::Tin),
        }
    }

    /// Kind the add-item form starts on when opened from this tab.
    pub fn draft_kind(self) -> CategoryTag {
        self.tag().unwrap_or(CategoryTag::Book)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryTab::All => "all",
            CategoryTab::Books => "books",
            CategoryTab::Patches => "patches",
            CategoryTab::Uniforms => "uniforms",
            CategoryTab::Tins => "tins",
        }
    }
}

impl fmt::Display for CategoryTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryTab {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(CategoryTab::All),
            "books" => Ok(CategoryTab::Books),
            "patches" => Ok(CategoryTab::Patches),
            "uniforms" => Ok(CategoryTab::Uniforms),
            "tins" => Ok(CategoryTab::Tins),
            other => Err(CatalogError::Validation(format!(
                "unknown category tab '{other}' (expected all, books, patches, uniforms or tins)"
            ))),
        }
    }
}

// ============================================================================
// View State
// ============================================================================

/// Presentation-owned selection. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    search_query: String,
    sort_mode: SortMode,
    selected_category: CategoryTab,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn selected_category(&self) -> CategoryTab {
        self.selected_category
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn set_sort_mode(&mut self, mode: SortMode) {
        self.sort_mode = mode;
    }

    pub fn set_selected_category(&mut self, tab: CategoryTab) {
        self.selected_category = tab;
    }

    /// Year sorts are only offered where books can appear.
    pub fn year_sort_available(&self) -> bool {
        matches!(
            self.selected_category,
            CategoryTab::All | CategoryTab::Books
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let view = ViewState::new();
        assert_eq!(view.search_query(), "");
        assert_eq!(view.sort_mode(), SortMode::Newest);
        assert_eq!(view.selected_category(), CategoryTab::All);
    }

    #[test]
    fn test_setters() {
        let mut view = ViewState::new();
        view.set_search_query("owl");
        view.set_sort_mode(SortMode::YearDesc);
        view.set_selected_category(CategoryTab::Patches);

        assert_eq!(view.search_query(), "owl");
        assert_eq!(view.sort_mode(), SortMode::YearDesc);
        assert_eq!(view.selected_category(), CategoryTab::Patches);
    }

    #[test]
    fn test_tab_query_keys() {
        assert_eq!(CategoryTab::All.query_key(), QueryKey::AllItems);
        assert_eq!(
            CategoryTab::Books.query_key(),
            QueryKey::ByCategory(CategoryTag::Book)
        );
        assert_eq!(
            CategoryTab::Tins.query_key(),
            QueryKey::ByCategory(CategoryTag::Tin)
        );
    }

    #[test]
    fn test_draft_kind_follows_tab() {
        assert_eq!(CategoryTab::Uniforms.draft_kind(), CategoryTag::Uniform);
        assert_eq!(CategoryTab::All.draft_kind(), CategoryTag::Book);
    }

    #[test]
    fn test_year_sort_availability() {
        let mut view = ViewState::new();
        assert!(view.year_sort_available());
        view.set_selected_category(CategoryTab::Books);
        assert!(view.year_sort_available());
        view.set_selected_category(CategoryTab::Tins);
        assert!(!view.year_sort_available());
    }

    #[test]
    fn test_only_enumerated_values_parse() {
        assert_eq!("year-asc".parse::<SortMode>().unwrap(), SortMode::YearAsc);
        assert!("alphabetical".parse::<SortMode>().is_err());
        assert_eq!("uniforms".parse::<CategoryTab>().unwrap(), CategoryTab::Uniforms);
        assert!("hats".parse::<CategoryTab>().is_err());
    }

    #[test]
    fn test_sort_mode_round_trips_through_display() {
        for mode in [
            SortMode::Newest,
            SortMode::Oldest,
            SortMode::YearAsc,
            SortMode::YearDesc,
        ] {
            assert_eq!(mode.to_string().parse::<SortMode>().unwrap(), mode);
        }
    }
}
