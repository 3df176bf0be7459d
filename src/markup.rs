//! Print stylesheets and HTML fragments for document → PDF rendering.
//!
//! Keeping the stylesheets as constants gives one place to change the
//! printed look, and lets tests inspect them without rendering anything.
//! Both force dark text on a white background so documents authored with a
//! dark theme still print legibly.

/// Stylesheet for DOCX-derived markup.
pub const DOCUMENT_STYLESHEET: &str = r#".printable, .printable * { color:#111 !important; background:#fff !important; }
.printable { padding:16px; line-height:1.5; font-size:12pt; font-family: ui-sans-serif, system-ui, -apple-system, Segoe UI, Roboto, Helvetica, Arial, "Apple Color Emoji", "Segoe UI Emoji"; }
.printable h1 { font-size:20pt; margin:0 0 10px; }
.printable h2 { font-size:16pt; margin:16px 0 8px; }
.printable h3 { font-size:14pt; margin:12px 0 6px; }
.printable p { margin:6px 0; }
.printable ul, .printable ol { margin:6px 0 6px 20px; }
.printable table { border-collapse:collapse; width:100%; }
.printable th, .printable td { border:1px solid #ddd; padding:6px; }"#;

/// Stylesheet for plain text and Markdown. Adds a monospace `pre` and the
/// opt-in `.page-break` class.
pub const TEXT_STYLESHEET: &str = r#".printable, .printable * { color:#111 !important; background:#fff !important; }
.printable { padding:16px; line-height:1.5; font-size:12pt; font-family: ui-sans-serif, system-ui, -apple-system, Segoe UI, Roboto, Helvetica, Arial; }
.printable h1 { font-size:20pt; margin:0 0 10px; }
.printable h2 { font-size:16pt; margin:16px 0 8px; }
.printable h3 { font-size:14pt; margin:12px 0 6px; }
.printable pre { font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, "Liberation Mono", monospace; }
.printable table { border-collapse:collapse; width:100%; }
.printable th, .printable td { border:1px solid #ddd; padding:6px; }
.page-break { page-break-before: always; }"#;

/// Escape the five HTML-significant characters.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Plain text as a wrapping preformatted block.
pub fn text_to_html(text: &str) -> String {
    format!(
        r#"<pre style="white-space:pre-wrap;word-break:break-word">{}</pre>"#,
        escape_html(text)
    )
}

/// Wrap `inner` in the printable container with `stylesheet`.
pub fn wrap_printable(stylesheet: &str, inner: &str) -> String {
    format!(r#"<div class="printable"><style>{stylesheet}</style><div>{inner}</div></div>"#)
}
