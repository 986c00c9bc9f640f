use serde::Serialize;

use crate::model::config::ExportConfig;
use crate::model::list::List;
use crate::util::unicode::wrap_to_width;

/// Width reserved for the `[x] ` checkbox glyph
const GLYPH_CELLS: usize = 4;
/// The title and the gap below it
const TITLE_LINES: usize = 2;

/// Page geometry for [`render`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Total line width in display cells, glyph included
    pub width: usize,
    pub lines_per_page: usize,
}

impl From<&ExportConfig> for Layout {
    fn from(config: &ExportConfig) -> Self {
        Layout {
            width: config.width,
            lines_per_page: config.lines_per_page,
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Layout::from(&ExportConfig::default())
    }
}

/// One printed line of an item. Long items wrap onto continuation lines,
/// which carry no checkbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocLine {
    pub checked: bool,
    pub text: String,
    pub strikethrough: bool,
    pub continuation: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Page {
    pub lines: Vec<DocLine>,
}

/// A list laid out for printing. The title heads the first page only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub title: String,
    pub pages: Vec<Page>,
}

/// Lay out a list as a paginated document.
pub fn render(list: &List, layout: Layout) -> Document {
    let text_width = layout.width.saturating_sub(GLYPH_CELLS).max(1);
    let per_page = layout.lines_per_page.max(1);
    let first_page = per_page.saturating_sub(TITLE_LINES).max(1);

    let lines = list.items.iter().flat_map(|item| {
        wrap_to_width(&item.text, text_width)
            .into_iter()
            .enumerate()
            .map(move |(i, text)| DocLine {
                checked: item.done,
                text,
                strikethrough: item.done,
                continuation: i > 0,
            })
    });

    let mut pages = vec![Page::default()];
    for line in lines {
        let capacity = if pages.len() == 1 { first_page } else { per_page };
        if pages.last().is_some_and(|p| p.lines.len() >= capacity) {
            pages.push(Page::default());
        }
        if let Some(page) = pages.last_mut() {
            page.lines.push(line);
        }
    }

    Document {
        title: list.name.clone(),
        pages,
    }
}

impl Document {
    /// Plain-text rendering: `[x]`/`[ ]` glyphs, `~~text~~` for done items,
    /// form feed between pages.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.title);
        out.push_str("\n\n");
        for (i, page) in self.pages.iter().enumerate() {
            if i > 0 {
                out.push('\u{c}');
                out.push('\n');
            }
            for line in &page.lines {
                let glyph = match (line.continuation, line.checked) {
                    (true, _) => "    ",
                    (false, true) => "[x] ",
                    (false, false) => "[ ] ",
                };
                out.push_str(glyph);
                if line.strikethrough {
                    out.push_str(&format!("~~{}~~", line.text));
                } else {
                    out.push_str(&line.text);
                }
                out.push('\n');
            }
        }
        out
    }
}

/// Default file name for an exported list
pub fn file_name(list: &List) -> String {
    let stem: String = list
        .name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '\0') { '_' } else { c })
        .collect();
    format!("{}.txt", stem)
}
