//! Markdown → HTML via `pulldown-cmark`.
//!
//! CommonMark only links `<https://…>`. With `simplified_autolink` set, bare
//! `http(s)://` and `www.` URLs in prose become links as well. The rewrite
//! runs on the parser's text events, so code spans, code blocks and existing
//! links are never touched.

use super::{MarkdownOptions, MarkupTransform};
use once_cell::sync::Lazy;
use pulldown_cmark::{
    html, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream,
};
use regex::Regex;

static BARE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|[\s(])((?:https?://|www\.)[^\s<>()\[\]`]+)").expect("valid regex")
});

/// [`MarkupTransform`] over `pulldown-cmark`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownToHtml;

impl MarkupTransform for MarkdownToHtml {
    fn to_html(&self, text: &str, options: &MarkdownOptions) -> String {
        let mut opts = Options::empty();
        if options.tables {
            opts.insert(Options::ENABLE_TABLES);
        }
        if options.strikethrough {
            opts.insert(Options::ENABLE_STRIKETHROUGH);
        }

        let parser = Parser::new_ext(text, opts);
        let mut out = String::with_capacity(text.len() * 3 / 2);
        if options.simplified_autolink {
            html::push_html(&mut out, autolink(TextMergeStream::new(parser)).into_iter());
        } else {
            html::push_html(&mut out, parser);
        }
        out
    }
}

/// Turn bare URLs in prose text events into links.
fn autolink<'a>(events: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    let mut out = Vec::new();
    let mut in_code_block = false;
    let mut link_depth = 0usize;

    for event in events {
        match event {
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => in_code_block = false,
            Event::Start(Tag::Link { .. } | Tag::Image { .. }) => link_depth += 1,
            Event::End(TagEnd::Link | TagEnd::Image) => link_depth = link_depth.saturating_sub(1),
            Event::Text(text) if !in_code_block && link_depth == 0 => {
                push_linked(text, &mut out);
                continue;
            }
            _ => {}
        }
        out.push(event);
    }
    out
}

fn push_linked<'a>(text: CowStr<'a>, out: &mut Vec<Event<'a>>) {
    let mut pieces = Vec::new();
    let mut last = 0;

    for caps in BARE_URL.captures_iter(&text) {
        let Some(matched) = caps.get(2) else {
            continue;
        };
        // Sentence punctuation directly after a URL is not part of it.
        let url = matched
            .as_str()
            .trim_end_matches(['.', ',', ';', ':', '!', '?', '\'', '"']);
        if url.is_empty() {
            continue;
        }

        if matched.start() > last {
            pieces.push(Event::Text(text[last..matched.start()].to_string().into()));
        }
        let dest = if url.starts_with("www.") {
            format!("http://{url}")
        } else {
            url.to_string()
        };
        pieces.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: dest.into(),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        pieces.push(Event::Text(url.to_string().into()));
        pieces.push(Event::End(TagEnd::Link));
        last = matched.start() + url.len();
    }

    if pieces.is_empty() {
        out.push(Event::Text(text));
        return;
    }
    if last < text.len() {
        pieces.push(Event::Text(text[last..].to_string().into()));
    }
    out.extend(pieces);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(md: &str) -> String {
        MarkdownToHtml.to_html(md, &MarkdownOptions::default())
    }

    #[test]
    fn headings_and_lists() {
        let html = render("# Title\n\n- one\n- two\n");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<li>one</li>"));
    }

    #[test]
    fn tables_enabled() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"), "got: {html}");
        assert!(html.contains("<td>2</td>"));
    }

    #[test]
    fn tables_disabled_stay_text() {
        let opts = MarkdownOptions {
            tables: false,
            ..MarkdownOptions::default()
        };
        let html = MarkdownToHtml.to_html("| a | b |\n|---|---|\n", &opts);
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn strikethrough() {
        assert!(render("~~gone~~").contains("<del>gone</del>"));
    }

    #[test]
    fn bare_urls_become_links() {
        let html = render("See https://example.com/a.");
        assert!(
            html.contains(r#"<a href="https://example.com/a">https://example.com/a</a>."#),
            "got: {html}"
        );
        let html = render("or www.example.org");
        assert!(html.contains(r#"href="http://www.example.org""#), "got: {html}");
    }

    #[test]
    fn urls_in_code_untouched() {
        let html = render("```\nhttps://example.com\n```\n");
        assert!(!html.contains("<a "), "got: {html}");

        let html = render("    https://example.com/indented\n");
        assert!(!html.contains("<a "), "got: {html}");

        let html = render("run `curl https://x.y/z` first");
        assert!(html.contains("<code>curl https://x.y/z</code>"), "got: {html}");
        assert!(!html.contains("<a "), "got: {html}");
    }

    #[test]
    fn existing_links_untouched() {
        let html = render("[site](https://example.com) and <https://b.example>");
        assert_eq!(html.matches("<a ").count(), 2, "got: {html}");
        assert!(html.contains(r#"<a href="https://example.com">site</a>"#));
    }

    #[test]
    fn autolink_can_be_disabled() {
        let opts = MarkdownOptions {
            simplified_autolink: false,
            ..MarkdownOptions::default()
        };
        let html = MarkdownToHtml.to_html("see https://example.com", &opts);
        assert!(!html.contains("<a "), "got: {html}");
    }
}
