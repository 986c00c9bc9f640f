use std::ops::Range;

use regex::Regex;

use crate::model::list::{ItemId, List, ListId};

/// Which field matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    ListName,
    ItemText,
}

/// A search hit in a list name or an item's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub list_id: ListId,
    /// `None` for list-name hits
    pub item_id: Option<ItemId>,
    pub field: MatchField,
    pub spans: Vec<Range<usize>>,
}

/// Collect all non-overlapping match byte-ranges for a regex in the given text.
fn find_matches(re: &Regex, text: &str) -> Vec<Range<usize>> {
    re.find_iter(text).map(|m| m.start()..m.end()).collect()
}

/// Search list names and item texts across the collection, in collection
/// order. If `list_filter` is `Some`, only that list is searched.
pub fn search_items(lists: &[List], re: &Regex, list_filter: Option<ListId>) -> Vec<SearchHit> {
    let mut hits = Vec::new();

    for list in lists {
        if list_filter.is_some_and(|id| id != list.id) {
            continue;
        }

        let spans = find_matches(re, &list.name);
        if !spans.is_empty() {
            hits.push(SearchHit {
                list_id: list.id,
                item_id: None,
                field: MatchField::ListName,
                spans,
            });
        }

        for item in &list.items {
            let spans = find_matches(re, &item.text);
            if !spans.is_empty() {
                hits.push(SearchHit {
                    list_id: list.id,
                    item_id: Some(item.id),
                    field: MatchField::ItemText,
                    spans,
                });
            }
        }
    }

    hits
}

/// Build a case-insensitive regex unless the pattern has uppercase letters.
pub fn smart_case_regex(pattern: &str) -> Result<Regex, regex::Error> {
    if pattern.chars().any(char::is_uppercase) {
        Regex::new(pattern)
    } else {
        Regex::new(&format!("(?i){}", pattern))
    }
}
