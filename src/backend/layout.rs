//! HTML → paginated text layout.
//!
//! The markup renderer does not run a browser engine. It parses the printable
//! HTML with `scraper`, flattens it into a list of [`Block`]s (headings,
//! paragraphs, preformatted text, list items, table rows, rules, page
//! breaks), then flows those blocks onto fixed-size pages with the metrics of
//! the print stylesheet: 12pt body text, 1.5 line height, 20/16/14pt
//! headings, 16px container padding.
//!
//! ## Why estimate glyph widths?
//!
//! The PDF standard fonts are not embedded and their metrics are not exposed
//! before a text object exists. Average advance widths (0.5em Helvetica,
//! 0.55em bold, 0.6em Courier) are close enough to wrap lines without ever
//! overrunning the margin, and keep the layout pure and testable.

use scraper::node::Node;
use scraper::{ElementRef, Html};
use std::borrow::Cow;

/// Body font size in points.
pub const BODY_SIZE: f32 = 12.0;
/// Line height as a multiple of font size.
pub const LINE_HEIGHT: f32 = 1.5;
/// Container padding (16px at 96 dpi).
pub const PADDING: f32 = 12.0;
/// Left indent per list level (20px).
const LIST_INDENT: f32 = 15.0;
/// Table cell padding (6px).
const CELL_PADDING: f32 = 4.5;
/// Paragraph margin (6px).
const PARAGRAPH_GAP: f32 = 4.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    Regular,
    Bold,
    Mono,
}

impl FontFace {
    /// Average glyph advance as a fraction of the font size.
    fn advance(self) -> f32 {
        match self {
            FontFace::Regular => 0.5,
            FontFace::Bold => 0.55,
            FontFace::Mono => 0.6,
        }
    }
}

/// A block-level element after flattening.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    Preformatted { text: String },
    ListItem { marker: String, depth: usize, text: String },
    TableRow { cells: Vec<String>, header: bool },
    Rule,
    PageBreak,
}

/// A single line of text. `baseline` is measured from the page top.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub x: f32,
    pub baseline: f32,
    pub text: String,
    pub face: FontFace,
    pub size: f32,
}

/// A straight stroke, in points from the page's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedRule {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidOutPage {
    pub texts: Vec<PlacedText>,
    pub rules: Vec<PlacedRule>,
}

impl LaidOutPage {
    fn is_empty(&self) -> bool {
        self.texts.is_empty() && self.rules.is_empty()
    }
}

// ── Parsing ──────────────────────────────────────────────────────────────

/// Flatten an HTML fragment into blocks, in document order.
pub fn extract_blocks(html: &str) -> Vec<Block> {
    let fragment = Html::parse_fragment(html);
    let mut blocks = Vec::new();
    walk(fragment.root_element(), &mut blocks);
    blocks
}

fn has_class(el: &ElementRef<'_>, class: &str) -> bool {
    el.value()
        .attr("class")
        .is_some_and(|c| c.split_whitespace().any(|c| c.eq_ignore_ascii_case(class)))
}

fn walk(parent: ElementRef<'_>, blocks: &mut Vec<Block>) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => {
                let text = collapse_whitespace(text);
                if !text.is_empty() {
                    blocks.push(Block::Paragraph { text });
                }
            }
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    visit(el, blocks);
                }
            }
            _ => {}
        }
    }
}

fn visit(el: ElementRef<'_>, blocks: &mut Vec<Block>) {
    if has_class(&el, "page-break") {
        blocks.push(Block::PageBreak);
    }

    let name = el.value().name();
    match name {
        "style" | "script" | "head" | "title" | "template" => {}
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse().unwrap_or(1);
            blocks.push(Block::Heading {
                level,
                text: inline_text(el),
            });
        }
        "p" => blocks.push(Block::Paragraph {
            text: inline_text(el),
        }),
        "pre" => blocks.push(Block::Preformatted {
            text: el.text().collect(),
        }),
        "ul" | "ol" => list(el, 0, blocks),
        "li" => blocks.push(Block::ListItem {
            marker: "•".into(),
            depth: 0,
            text: inline_text(el),
        }),
        "tr" => blocks.push(table_row(el)),
        "hr" => blocks.push(Block::Rule),
        "br" => {}
        "html" | "body" | "div" | "section" | "article" | "main" | "header" | "footer"
        | "blockquote" | "table" | "thead" | "tbody" | "tfoot" | "figure" | "dl" | "dd"
        | "dt" => walk(el, blocks),
        _ => {
            // Inline element sitting at block level.
            let text = inline_text(el);
            if !text.is_empty() {
                blocks.push(Block::Paragraph { text });
            }
        }
    }
}

fn list(el: ElementRef<'_>, depth: usize, blocks: &mut Vec<Block>) {
    let ordered = el.value().name() == "ol";
    let mut number: u64 = el
        .value()
        .attr("start")
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(1);

    for item in el.children().filter_map(ElementRef::wrap) {
        if item.value().name() != "li" {
            continue;
        }
        let marker = if ordered {
            format!("{number}.")
        } else {
            "•".to_string()
        };
        number += 1;

        blocks.push(Block::ListItem {
            marker,
            depth,
            text: inline_text(item),
        });

        for nested in item.children().filter_map(ElementRef::wrap) {
            if matches!(nested.value().name(), "ul" | "ol") {
                list(nested, depth + 1, blocks);
            }
        }
    }
}

fn table_row(el: ElementRef<'_>) -> Block {
    let mut header = false;
    let cells: Vec<String> = el
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|c| matches!(c.value().name(), "td" | "th"))
        .map(|c| {
            header |= c.value().name() == "th";
            inline_text(c)
        })
        .collect();
    Block::TableRow { cells, header }
}

/// Text content with whitespace collapsed per line. `<br>` and paragraph
/// boundaries become newlines; nested lists are excluded.
fn inline_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_inline(el, &mut raw);
    raw.split('\n')
        .map(collapse_whitespace)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_inline(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&text.replace('\n', " ")),
            Node::Element(e) => match e.name() {
                "br" => out.push('\n'),
                "ul" | "ol" | "style" | "script" => {}
                "p" | "div" => {
                    if let Some(inner) = ElementRef::wrap(child) {
                        out.push('\n');
                        collect_inline(inner, out);
                        out.push('\n');
                    }
                }
                _ => {
                    if let Some(inner) = ElementRef::wrap(child) {
                        collect_inline(inner, out);
                    }
                }
            },
            _ => {}
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Wrapping ─────────────────────────────────────────────────────────────

/// Characters that fit in `width` points at `size` in `face`.
fn capacity(width: f32, size: f32, face: FontFace) -> usize {
    ((width / (size * face.advance())).floor() as usize).max(1)
}

/// Greedy word wrap. Words longer than a line are split.
pub fn wrap_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for source in text.split('\n') {
        let mut line = String::new();
        let mut len = 0usize;
        for word in source.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if len > 0 {
                    lines.push(std::mem::take(&mut line));
                    len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            if word.is_empty() {
                continue;
            }
            let needed = if len == 0 { word.len() } else { len + 1 + word.len() };
            if needed > max_chars {
                lines.push(std::mem::take(&mut line));
                len = 0;
            }
            if len > 0 {
                line.push(' ');
                len += 1;
            }
            line.extend(word.iter());
            len += word.len();
        }
        if len > 0 {
            lines.push(line);
        }
    }
    lines
}

/// Hard wrap preserving leading whitespace (`pre-wrap` + `break-word`).
pub fn wrap_preformatted(text: &str, max_chars: usize) -> Vec<String> {
    let text = text.strip_suffix('\n').unwrap_or(text);
    let mut lines = Vec::new();
    for source in text.split('\n') {
        let expanded = source.trim_end_matches('\r').replace('\t', "    ");
        let chars: Vec<char> = expanded.chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
            continue;
        }
        for chunk in chars.chunks(max_chars) {
            lines.push(chunk.iter().collect());
        }
    }
    lines
}

// ── Glyphs ───────────────────────────────────────────────────────────────

/// Stand-in for characters the standard fonts cannot draw.
pub const REPLACEMENT_GLYPH: char = '?';

/// Whether the standard fonts' WinAnsi encoding has a glyph for `c`.
pub fn has_standard_glyph(c: char) -> bool {
    matches!(c, ' '..='~' | '\u{a0}'..='\u{ff}')
        || "€‚ƒ„…†‡ˆ‰Š‹ŒŽ‘’“”•–—˜™š›œžŸ".contains(c)
}

/// Replace characters outside WinAnsi with [`REPLACEMENT_GLYPH`]. Returns
/// the drawable text and how many characters were replaced.
pub fn standard_glyphs(text: &str) -> (Cow<'_, str>, usize) {
    let missing = text.chars().filter(|&c| !has_standard_glyph(c)).count();
    if missing == 0 {
        return (Cow::Borrowed(text), 0);
    }
    let drawable = text
        .chars()
        .map(|c| if has_standard_glyph(c) { c } else { REPLACEMENT_GLYPH })
        .collect();
    (Cow::Owned(drawable), missing)
}

// ── Pagination ───────────────────────────────────────────────────────────

struct Flow {
    left: f32,
    top: f32,
    bottom: f32,
    content_width: f32,
    y: f32,
    current: LaidOutPage,
    pages: Vec<LaidOutPage>,
}

impl Flow {
    fn new(page: (f32, f32), margin: f32) -> Self {
        let (page_width, page_height) = page;
        let inset = margin + PADDING;
        Self {
            left: inset,
            top: inset,
            bottom: page_height - inset,
            content_width: (page_width - 2.0 * inset).max(1.0),
            y: inset,
            current: LaidOutPage::default(),
            pages: Vec::new(),
        }
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = self.top;
    }

    /// Start a new page unless `height` still fits (or the page is empty).
    fn reserve(&mut self, height: f32) {
        if self.y + height > self.bottom && !self.current.is_empty() {
            self.new_page();
        }
    }

    fn gap(&mut self, height: f32) {
        if !self.current.is_empty() {
            self.y += height;
        }
    }

    fn lines(&mut self, lines: &[String], x: f32, face: FontFace, size: f32) {
        let line_height = size * LINE_HEIGHT;
        for line in lines {
            self.reserve(line_height);
            let baseline = self.y + (line_height + size * 0.7) / 2.0;
            if !line.is_empty() {
                self.current.texts.push(PlacedText {
                    x,
                    baseline,
                    text: line.clone(),
                    face,
                    size,
                });
            }
            self.y += line_height;
        }
    }

    fn paragraph(&mut self, text: &str, indent: f32, face: FontFace, size: f32) {
        let width = self.content_width - indent;
        let lines = wrap_words(text, capacity(width, size, face));
        self.lines(&lines, self.left + indent, face, size);
    }

    fn list_item(&mut self, marker: &str, depth: usize, text: &str) {
        let indent = LIST_INDENT * (depth as f32 + 1.0);
        let line_height = BODY_SIZE * LINE_HEIGHT;

        // Marker sits on the item's first line.
        self.reserve(line_height);
        self.current.texts.push(PlacedText {
            x: (self.left + indent - BODY_SIZE * 1.2).max(self.left),
            baseline: self.y + (line_height + BODY_SIZE * 0.7) / 2.0,
            text: marker.to_string(),
            face: FontFace::Regular,
            size: BODY_SIZE,
        });
        if text.trim().is_empty() {
            self.y += line_height;
            return;
        }
        self.paragraph(text, indent, FontFace::Regular, BODY_SIZE);
    }

    fn table_row(&mut self, cells: &[String], header: bool) {
        if cells.is_empty() {
            return;
        }
        let face = if header { FontFace::Bold } else { FontFace::Regular };
        let columns = cells.len() as f32;
        let column_width = self.content_width / columns;
        let inner = (column_width - 2.0 * CELL_PADDING).max(1.0);
        let wrapped: Vec<Vec<String>> = cells
            .iter()
            .map(|c| wrap_words(c, capacity(inner, BODY_SIZE, face)))
            .collect();
        let max_lines = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let line_height = BODY_SIZE * LINE_HEIGHT;
        let row_height = max_lines as f32 * line_height + 2.0 * CELL_PADDING;

        self.reserve(row_height);
        let top = self.y;
        for (col, lines) in wrapped.iter().enumerate() {
            let x = self.left + col as f32 * column_width + CELL_PADDING;
            for (i, line) in lines.iter().enumerate() {
                self.current.texts.push(PlacedText {
                    x,
                    baseline: top
                        + CELL_PADDING
                        + i as f32 * line_height
                        + (line_height + BODY_SIZE * 0.7) / 2.0,
                    text: line.clone(),
                    face,
                    size: BODY_SIZE,
                });
            }
        }

        let right = self.left + self.content_width;
        let bottom = top + row_height;
        self.current.rules.push(PlacedRule { x1: self.left, y1: top, x2: right, y2: top });
        self.current.rules.push(PlacedRule { x1: self.left, y1: bottom, x2: right, y2: bottom });
        for col in 0..=cells.len() {
            let x = self.left + col as f32 * column_width;
            self.current.rules.push(PlacedRule { x1: x, y1: top, x2: x, y2: bottom });
        }
        self.y = bottom;
    }

    fn rule(&mut self) {
        self.reserve(BODY_SIZE);
        let y = self.y + BODY_SIZE / 2.0;
        self.current.rules.push(PlacedRule {
            x1: self.left,
            y1: y,
            x2: self.left + self.content_width,
            y2: y,
        });
        self.y += BODY_SIZE;
    }

    fn finish(mut self) -> Vec<LaidOutPage> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

fn heading_style(level: u8) -> (f32, f32, f32) {
    // (size, space above, space below) in points
    match level {
        1 => (20.0, 0.0, 7.5),
        2 => (16.0, 12.0, 6.0),
        3 => (14.0, 9.0, 4.5),
        _ => (BODY_SIZE, 9.0, 4.5),
    }
}

/// Flow `blocks` onto pages of `page` = `(width, height)` points with
/// `margin` on every side. Always returns at least one page.
pub fn layout(blocks: &[Block], page: (f32, f32), margin: f32) -> Vec<LaidOutPage> {
    let mut flow = Flow::new(page, margin);
    let mut previous_row = false;

    for block in blocks {
        let is_row = matches!(block, Block::TableRow { .. });
        if previous_row && !is_row {
            flow.gap(PARAGRAPH_GAP);
        }

        match block {
            Block::Heading { level, text } => {
                let (size, above, below) = heading_style(*level);
                flow.gap(above);
                flow.paragraph(text, 0.0, FontFace::Bold, size);
                flow.y += below;
            }
            Block::Paragraph { text } => {
                flow.gap(PARAGRAPH_GAP);
                if text.is_empty() {
                    flow.y += BODY_SIZE * LINE_HEIGHT;
                } else {
                    flow.paragraph(text, 0.0, FontFace::Regular, BODY_SIZE);
                }
                flow.y += PARAGRAPH_GAP;
            }
            Block::Preformatted { text } => {
                let lines = wrap_preformatted(text, capacity(flow.content_width, BODY_SIZE, FontFace::Mono));
                let x = flow.left;
                flow.lines(&lines, x, FontFace::Mono, BODY_SIZE);
            }
            Block::ListItem { marker, depth, text } => flow.list_item(marker, *depth, text),
            Block::TableRow { cells, header } => {
                if !previous_row {
                    flow.gap(PARAGRAPH_GAP);
                }
                flow.table_row(cells, *header);
            }
            Block::Rule => flow.rule(),
            Block::PageBreak => {
                if !flow.current.is_empty() {
                    flow.new_page();
                }
            }
        }
        previous_row = is_row;
    }

    flow.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{text_to_html, wrap_printable, TEXT_STYLESHEET};

    const A4: (f32, f32) = (595.28, 841.89);

    #[test]
    fn blocks_from_markdown_like_html() {
        let html = "<h1>Title</h1><p>Hello <strong>bold</strong> world</p>\
                    <ul><li>one</li><li>two<ol><li>inner</li></ol></li></ul><hr>";
        let blocks = extract_blocks(html);
        assert_eq!(
            blocks,
            vec![
                Block::Heading { level: 1, text: "Title".into() },
                Block::Paragraph { text: "Hello bold world".into() },
                Block::ListItem { marker: "•".into(), depth: 0, text: "one".into() },
                Block::ListItem { marker: "•".into(), depth: 0, text: "two".into() },
                Block::ListItem { marker: "1.".into(), depth: 1, text: "inner".into() },
                Block::Rule,
            ]
        );
    }

    #[test]
    fn stylesheet_is_not_content() {
        let html = wrap_printable(TEXT_STYLESHEET, "<p>only this</p>");
        let blocks = extract_blocks(&html);
        assert_eq!(blocks, vec![Block::Paragraph { text: "only this".into() }]);
    }

    #[test]
    fn preformatted_keeps_whitespace() {
        let blocks = extract_blocks(&text_to_html("a  b\n\tc <d>"));
        assert_eq!(
            blocks,
            vec![Block::Preformatted { text: "a  b\n\tc <d>".into() }]
        );
    }

    #[test]
    fn table_rows_and_page_break_class() {
        let html = "<table><thead><tr><th>A</th><th>B</th></tr></thead>\
                    <tbody><tr><td>1</td><td>2</td></tr></tbody></table>\
                    <div class=\"page-break\"></div><p>next</p>";
        let blocks = extract_blocks(html);
        assert_eq!(
            blocks,
            vec![
                Block::TableRow { cells: vec!["A".into(), "B".into()], header: true },
                Block::TableRow { cells: vec!["1".into(), "2".into()], header: false },
                Block::PageBreak,
                Block::Paragraph { text: "next".into() },
            ]
        );
    }

    #[test]
    fn wrap_words_respects_width() {
        let lines = wrap_words("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
        let lines = wrap_words("abcdefghijkl", 5);
        assert_eq!(lines, vec!["abcde", "fghij", "kl"]);
    }

    #[test]
    fn wrap_preformatted_breaks_long_lines() {
        let lines = wrap_preformatted("  abcdef\n\nxy\n", 4);
        assert_eq!(lines, vec!["  ab", "cdef", "", "xy"]);
    }

    #[test]
    fn empty_document_has_one_page() {
        let pages = layout(&[], A4, 12.0);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].texts.is_empty());
    }

    #[test]
    fn long_text_paginates_within_margins() {
        let text = (0..200).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let pages = layout(&[Block::Preformatted { text }], A4, 12.0);
        assert!(pages.len() > 1, "expected several pages, got {}", pages.len());
        for page in &pages {
            for t in &page.texts {
                assert!(t.baseline > 24.0 && t.baseline < A4.1 - 24.0);
                assert_eq!(t.x, 24.0);
            }
        }
        let total: usize = pages.iter().map(|p| p.texts.len()).sum();
        assert_eq!(total, 200);
    }

    #[test]
    fn page_break_starts_new_page() {
        let blocks = vec![
            Block::Paragraph { text: "one".into() },
            Block::PageBreak,
            Block::Paragraph { text: "two".into() },
        ];
        let pages = layout(&blocks, A4, 10.0);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].texts[0].text, "two");
    }

    #[test]
    fn table_rows_draw_borders() {
        let blocks = vec![Block::TableRow { cells: vec!["a".into(), "b".into()], header: false }];
        let pages = layout(&blocks, A4, 10.0);
        // top, bottom, and three vertical separators
        assert_eq!(pages[0].rules.len(), 5);
        assert_eq!(pages[0].texts.len(), 2);
    }

    #[test]
    fn glyphs_outside_win_ansi_are_replaced() {
        let (text, missing) = standard_glyphs("Café – “ok” • 10€");
        assert_eq!(text, "Café – “ok” • 10€");
        assert_eq!(missing, 0);
        assert!(matches!(text, Cow::Borrowed(_)));

        let (text, missing) = standard_glyphs("日本 ok ✓");
        assert_eq!(text, "?? ok ?");
        assert_eq!(missing, 3);
    }
}
