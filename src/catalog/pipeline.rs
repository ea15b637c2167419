//! Derivation of the displayed list from a base collection and the view state.
//!
//! Pure and synchronous: the input is never mutated and nothing is memoized.
//! Callers re-run [`derive_visible`] whenever the view state or the base
//! collection changes.
use std::cmp::Ordering;

use super::category::Category;
use super::item::Item;
use super::view::{SortMode, ViewState};

/// Filter `items` by the search text, then sort by the view's sort mode.
pub fn derive_visible(items: &[Item], view: &ViewState) -> Vec<Item> {
    let query = view.search_query();
    // Trim only decides whether to filter; matching uses the query as typed
    let mut visible: Vec<Item> = if query.trim().is_empty() {
        items.to_vec()
    } else {
        let needle = query.to_lowercase();
        items
            .iter()
            .filter(|item| matches_search(item, &needle))
            .cloned()
            .collect()
    };

    match view.sort_mode() {
        SortMode::Newest => visible.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
        SortMode::Oldest => visible.sort_by_key(|item| item.timestamp),
        SortMode::YearAsc => sort_books_in_place(&mut visible, false),
        SortMode::YearDesc => sort_books_in_place(&mut visible, true),
    }
    visible
}

/// Books match on their title, everything else on its id.
///
/// `needle` must already be lowercased.
fn matches_search(item: &Item, needle: &str) -> bool {
    let haystack = match &item.category {
        Category::Book { name, .. } => name,
        Category::Tin | Category::Patch | Category::Uniform => &item.id,
    };
    haystack.to_lowercase().contains(needle)
}

/// Reorder the books among the slots books occupy; everything else keeps its
/// index. Equal years fall back to ascending title, then input order.
fn sort_books_in_place(items: &mut [Item], descending: bool) {
    let slots: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| year_key(item).is_some())
        .map(|(slot, _)| slot)
        .collect();
    let mut books: Vec<Item> = slots.iter().map(|&slot| items[slot].clone()).collect();

    books.sort_by(|a, b| match (year_key(a), year_key(b)) {
        (Some((year_a, name_a)), Some((year_b, name_b))) => {
            let by_year = if descending {
                year_b.cmp(&year_a)
            } else {
                year_a.cmp(&year_b)
            };
            by_year.then_with(|| name_a.cmp(name_b))
        }
        // Only books are collected above
        _ => Ordering::Equal,
    });

    for (slot, book) in slots.into_iter().zip(books) {
        items[slot] = book;
    }
}

fn year_key(item: &Item) -> Option<(i64, &str)> {
    match &item.category {
        Category::Book { name, year } => Some((*year, name.as_str())),
        Category::Tin | Category::Patch | Category::Uniform => None,
    }
}
