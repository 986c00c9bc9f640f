use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width in terminal cells. Tabs count as 4 cells.
pub fn display_width(s: &str) -> usize {
    s.split('\t')
        .enumerate()
        .map(|(i, part)| {
            let w = UnicodeWidthStr::width(part);
            if i > 0 { w + 4 } else { w }
        })
        .sum()
}

/// Truncate a string to fit within `max_cells` terminal cells, appending `…` if truncated.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if max_cells == 0 {
        return String::new();
    }
    let sw = display_width(s);
    if sw <= max_cells {
        return s.to_string();
    }
    if max_cells <= 1 {
        return "\u{2026}".to_string();
    }
    let budget = max_cells - 1; // reserve 1 cell for '…'
    let mut width = 0;
    let mut result = String::new();
    for grapheme in s.graphemes(true) {
        let gw = grapheme_display_width(grapheme);
        if width + gw > budget {
            break;
        }
        width += gw;
        result.push_str(grapheme);
    }
    result.push('\u{2026}');
    result
}

/// Pad with spaces to `cells` display cells (no-op when already wider).
pub fn pad_to_width(s: &str, cells: usize) -> String {
    let w = display_width(s);
    if w >= cells {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(cells - w))
    }
}

/// Greedy word wrap to `width` display cells.
///
/// Breaks at whitespace; a word wider than `width` is split between
/// graphemes. Runs of whitespace collapse to a single space. Always returns
/// at least one line.
pub fn wrap_to_width(s: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut col = 0;

    for word in s.split_whitespace() {
        let ww = display_width(word);
        let sep = usize::from(col > 0);
        if col + sep + ww <= width {
            if sep == 1 {
                current.push(' ');
            }
            current.push_str(word);
            col += sep + ww;
            continue;
        }
        if col > 0 {
            lines.push(std::mem::take(&mut current));
            col = 0;
        }
        if ww <= width {
            current.push_str(word);
            col = ww;
            continue;
        }
        for g in word.graphemes(true) {
            let gw = grapheme_display_width(g);
            if col + gw > width && col > 0 {
                lines.push(std::mem::take(&mut current));
                col = 0;
            }
            current.push_str(g);
            col += gw;
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Display width of a grapheme cluster.
fn grapheme_display_width(g: &str) -> usize {
    if g == "\t" {
        return 4;
    }
    UnicodeWidthStr::width(g)
}
