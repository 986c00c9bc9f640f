use serde::Serialize;

use crate::io::remote::{RemoteList, RemoteListDetail};
use crate::model::list::{Item, List, ListId};
use crate::ops::list_ops;
use crate::ops::search::{MatchField, SearchHit};
use crate::session::MoveTarget;
use crate::util::unicode::{pad_to_width, truncate_to_width};

/// Width of the name column in `lm lists`
const NAME_CELLS: usize = 32;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ListSummaryJson {
    pub id: u64,
    pub name: String,
    pub pinned: bool,
    pub selected: bool,
    pub items: usize,
    pub done: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Serialize)]
pub struct ListsJson {
    pub pinned: Vec<ListSummaryJson>,
    pub lists: Vec<ListSummaryJson>,
}

#[derive(Serialize)]
pub struct ItemJson {
    pub id: u64,
    pub text: String,
    pub done: bool,
}

#[derive(Serialize)]
pub struct ListDetailJson {
    pub id: u64,
    pub name: String,
    pub pinned: bool,
    pub items: Vec<ItemJson>,
}

#[derive(Serialize)]
pub struct SearchHitJson {
    pub list: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<u64>,
    pub field: &'static str,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn list_to_summary(list: &List, selected: Option<ListId>) -> ListSummaryJson {
    ListSummaryJson {
        id: list.id.0,
        name: list.name.clone(),
        pinned: list.is_pinned,
        selected: selected == Some(list.id),
        items: list.items.len(),
        done: list.done_count(),
        created_at: list.created_at.map(|t| t.to_rfc3339()),
    }
}

pub fn lists_to_json(lists: &[List], selected: Option<ListId>) -> ListsJson {
    let (pinned, unpinned) = list_ops::partition_by_pin(lists);
    ListsJson {
        pinned: pinned.iter().map(|l| list_to_summary(l, selected)).collect(),
        lists: unpinned.iter().map(|l| list_to_summary(l, selected)).collect(),
    }
}

pub fn item_to_json(item: &Item) -> ItemJson {
    ItemJson {
        id: item.id.0,
        text: item.text.clone(),
        done: item.done,
    }
}

pub fn list_to_detail(list: &List) -> ListDetailJson {
    ListDetailJson {
        id: list.id.0,
        name: list.name.clone(),
        pinned: list.is_pinned,
        items: list.items.iter().map(item_to_json).collect(),
    }
}

pub fn hit_to_json(hit: &SearchHit, lists: &[List]) -> SearchHitJson {
    SearchHitJson {
        list: hit.list_id.0,
        item: hit.item_id.map(|id| id.0),
        field: field_name(hit.field),
        text: hit_text(hit, lists).unwrap_or_default(),
    }
}

fn field_name(field: MatchField) -> &'static str {
    match field {
        MatchField::ListName => "name",
        MatchField::ItemText => "item",
    }
}

fn hit_text(hit: &SearchHit, lists: &[List]) -> Option<String> {
    let list = list_ops::find_by_id(lists, hit.list_id)?;
    match hit.item_id {
        Some(id) => list.item(id).map(|i| i.text.clone()),
        None => Some(list.name.clone()),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// One row of `lm lists`: selection marker, pin marker, id, name, progress
pub fn format_list_line(list: &List, selected: Option<ListId>) -> String {
    let marker = if selected == Some(list.id) { '>' } else { ' ' };
    let pin = if list.is_pinned { '*' } else { ' ' };
    format!(
        "{}{} {:>4}  {}  {}/{}",
        marker,
        pin,
        list.id,
        pad_to_width(&truncate_to_width(&list.name, NAME_CELLS), NAME_CELLS),
        list.done_count(),
        list.items.len()
    )
}

/// `lm lists` output: pinned lists, then the rest, each in collection order
pub fn format_lists(lists: &[List], selected: Option<ListId>) -> Vec<String> {
    let (pinned, unpinned) = list_ops::partition_by_pin(lists);
    let mut lines = Vec::new();
    if !pinned.is_empty() {
        lines.push("-- Pinned --".to_string());
        lines.extend(pinned.iter().map(|l| format_list_line(l, selected)));
        if !unpinned.is_empty() {
            lines.push(String::new());
        }
    }
    lines.extend(unpinned.iter().map(|l| format_list_line(l, selected)));
    lines
}

pub fn format_item_line(item: &Item) -> String {
    let glyph = if item.done { "[x]" } else { "[ ]" };
    format!("{} {:>4}  {}", glyph, item.id, item.text)
}

/// `lm show` output
pub fn format_list_detail(list: &List) -> Vec<String> {
    let pin = if list.is_pinned { " *" } else { "" };
    let mut lines = vec![format!("== {} ({}){} ==", list.name, list.id, pin)];
    if list.items.is_empty() {
        lines.push("(no items)".to_string());
    } else {
        lines.extend(list.items.iter().map(format_item_line));
    }
    lines
}

pub fn format_search_hit(hit: &SearchHit, lists: &[List]) -> Option<String> {
    let list = list_ops::find_by_id(lists, hit.list_id)?;
    match hit.item_id {
        Some(id) => list
            .item(id)
            .map(|item| format!("[{}] {}", list.name, format_item_line(item))),
        None => Some(format!("[{}] (list {})", list.name, list.id)),
    }
}

pub fn format_remote_list(list: &RemoteList) -> String {
    let pin = if list.pinned { "*" } else { " " };
    format!("{} {}  {}", pin, list.id, list.name)
}

pub fn format_remote_detail(detail: &RemoteListDetail) -> Vec<String> {
    let mut lines = vec![format!("== {} ({}) ==", detail.list.name, detail.list.id)];
    if let Some(email) = detail.user.as_ref().and_then(|u| u.email.as_deref()) {
        lines.push(format!("owner: {}", email));
    }
    for item in &detail.list_items {
        let glyph = if item.done { "[x]" } else { "[ ]" };
        lines.push(format!(
            "{} {}",
            glyph,
            item.name.as_deref().unwrap_or("(unnamed)")
        ));
    }
    lines
}

/// Parse a `--to` value for `lm bulk move`
pub fn parse_move_target(s: &str) -> Result<MoveTarget, String> {
    match s {
        "top" => Ok(MoveTarget::Top),
        "bottom" => Ok(MoveTarget::Bottom),
        other => other.parse::<ListId>().map(MoveTarget::List).map_err(|_| {
            format!(
                "invalid destination '{}' (expected: top, bottom, or a list ID)",
                other
            )
        }),
    }
}
