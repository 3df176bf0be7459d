//! DOCX → HTML via `docx-rs`.
//!
//! Only the structure the print renderer can use is kept: paragraphs,
//! headings (from `Title`/`Heading N` styles), bullet and numbered
//! paragraphs, bold/italic runs, line and page breaks, tables, and the
//! paragraphs of text boxes. Images, headers, footers and comments are
//! dropped.
//!
//! A text box sits inside a run of its anchoring paragraph but holds
//! paragraphs of its own. HTML cannot nest those, so the anchoring
//! paragraph is written whole and the text box paragraphs follow it.

use super::DocumentToMarkup;
use crate::error::FileError;
use crate::markup::escape_html;
use docx_rs::{
    DocumentChild, DrawingData, InsertChild, Paragraph, ParagraphChild, Run, RunChild, Table,
    TableCellContent, TableChild, TableRowChild, TextBoxContentChild,
};
use serde::Serialize;
use tracing::debug;

/// [`DocumentToMarkup`] for Office Open XML word-processing documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxToHtml;

impl DocumentToMarkup for DocxToHtml {
    fn convert(&self, bytes: &[u8]) -> Result<String, FileError> {
        let docx = docx_rs::read_docx(bytes)
            .map_err(|e| FileError::render(format!("unreadable DOCX: {e}")))?;

        let html = HtmlWriter::default().document(&docx.document.children);
        debug!(
            "DOCX body: {} blocks → {} bytes HTML",
            docx.document.children.len(),
            html.len()
        );
        Ok(html)
    }
}

/// Inline content of one paragraph, plus what must follow it.
#[derive(Default)]
struct Inline<'d> {
    html: String,
    page_break: bool,
    text_boxes: Vec<&'d TextBoxContentChild>,
}

impl<'d> Inline<'d> {
    fn children(&mut self, children: &'d [ParagraphChild]) {
        for child in children {
            match child {
                ParagraphChild::Run(run) => self.run(run),
                ParagraphChild::Hyperlink(link) => self.children(&link.children),
                ParagraphChild::Insert(insert) => {
                    for child in &insert.children {
                        if let InsertChild::Run(run) = child {
                            self.run(run);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn run(&mut self, run: &'d Run) {
        let bold = toggled(&run.run_property.bold);
        let italic = toggled(&run.run_property.italic);

        for child in &run.children {
            match child {
                RunChild::Text(text) => {
                    let escaped = escape_html(&text.text);
                    match (bold, italic) {
                        (true, true) => {
                            self.html.push_str(&format!("<strong><em>{escaped}</em></strong>"))
                        }
                        (true, false) => self.html.push_str(&format!("<strong>{escaped}</strong>")),
                        (false, true) => self.html.push_str(&format!("<em>{escaped}</em>")),
                        (false, false) => self.html.push_str(&escaped),
                    }
                }
                RunChild::Tab(_) => self.html.push(' '),
                RunChild::Break(brk) if is_page_break(brk) => self.page_break = true,
                RunChild::Break(_) => self.html.push_str("<br>"),
                RunChild::Drawing(drawing) => {
                    if let Some(DrawingData::TextBox(text_box)) = &drawing.data {
                        self.text_boxes.extend(text_box.children.iter());
                    }
                }
                _ => {}
            }
        }
    }
}

#[derive(Default)]
struct HtmlWriter {
    out: String,
    list_open: bool,
}

impl HtmlWriter {
    fn document(mut self, children: &[DocumentChild]) -> String {
        for child in children {
            match child {
                DocumentChild::Paragraph(p) => self.paragraph(p, false),
                DocumentChild::Table(t) => self.table(t),
                _ => {}
            }
        }
        self.close_list();
        self.out
    }

    fn paragraph(&mut self, p: &Paragraph, in_table: bool) {
        let mut inline = Inline::default();
        inline.children(&p.children);
        let body = &inline.html;

        if in_table {
            self.out.push_str(&format!("<p>{body}</p>"));
        } else if p.property.numbering_property.is_some() {
            if !self.list_open {
                self.out.push_str("<ul>");
                self.list_open = true;
            }
            self.out.push_str(&format!("<li>{body}</li>"));
        } else {
            self.close_list();
            let style = p.property.style.as_ref().map(|s| s.val.as_str());
            match style.and_then(heading_level) {
                Some(level) => self.out.push_str(&format!("<h{level}>{body}</h{level}>")),
                None => self.out.push_str(&format!("<p>{body}</p>")),
            }
        }

        for child in inline.text_boxes {
            match child {
                TextBoxContentChild::Paragraph(p) => self.paragraph(p, in_table),
                TextBoxContentChild::Table(t) => self.table(t),
            }
        }

        if inline.page_break && !in_table {
            self.close_list();
            self.out.push_str(r#"<div class="page-break"></div>"#);
        }
    }

    fn table(&mut self, table: &Table) {
        self.close_list();
        self.out.push_str("<table>");
        for row in &table.rows {
            #[allow(irrefutable_let_patterns)]
            let TableChild::TableRow(row) = row else {
                continue;
            };
            self.out.push_str("<tr>");
            for cell in &row.cells {
                #[allow(irrefutable_let_patterns)]
                let TableRowChild::TableCell(cell) = cell else {
                    continue;
                };
                self.out.push_str("<td>");
                for content in &cell.children {
                    match content {
                        TableCellContent::Paragraph(p) => self.paragraph(p, true),
                        TableCellContent::Table(t) => self.table(t),
                        _ => {}
                    }
                }
                self.out.push_str("</td>");
            }
            self.out.push_str("</tr>");
        }
        self.out.push_str("</table>");
    }

    fn close_list(&mut self) {
        if self.list_open {
            self.out.push_str("</ul>");
            self.list_open = false;
        }
    }
}

/// `<w:b/>` is on; `<w:b w:val="0"/>` is read as a toggle serialised `false`.
fn toggled<T: Serialize>(toggle: &Option<T>) -> bool {
    toggle.as_ref().is_some_and(|t| {
        serde_json::to_value(t).map_or(true, |v| v != serde_json::Value::Bool(false))
    })
}

fn is_page_break<T: Serialize>(brk: &T) -> bool {
    serde_json::to_string(brk).is_ok_and(|json| json.to_lowercase().contains("page"))
}

fn heading_level(style: &str) -> Option<u8> {
    let style: String = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    match style.as_str() {
        "title" => Some(1),
        "subtitle" => Some(2),
        _ => style
            .strip_prefix("heading")
            .and_then(|n| n.parse::<u8>().ok())
            .map(|n| n.clamp(1, 6)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    const NAMESPACES: &str = concat!(
        r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
        r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
        r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
        r#"xmlns:wps="http://schemas.microsoft.com/office/word/2010/wordprocessingShape""#,
    );

    const CONTENT_TYPES: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
        r#"<Default Extension="xml" ContentType="application/xml"/>"#,
        r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
        r#"</Types>"#,
    );

    const PACKAGE_RELS: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
        r#"</Relationships>"#,
    );

    const DOCUMENT_RELS: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"/>"#,
    );

    /// A minimal DOCX package around `body`.
    fn docx(body: &str) -> Vec<u8> {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {NAMESPACES}><w:body>{body}</w:body></w:document>"#
        );
        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", PACKAGE_RELS),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS),
            ("word/document.xml", document.as_str()),
        ];

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, xml) in parts {
            zip.start_file(name, SimpleFileOptions::default()).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn html(body: &str) -> String {
        DocxToHtml.convert(&docx(body)).unwrap()
    }

    fn text_box(inner: &str) -> String {
        format!(
            concat!(
                r#"<w:r><w:drawing><wp:anchor distT="0" distB="0" distL="114300" distR="114300" "#,
                r#"simplePos="0" relativeHeight="251659264" behindDoc="0" locked="0" "#,
                r#"layoutInCell="1" allowOverlap="1"><wp:simplePos x="0" y="0"/>"#,
                r#"<wp:positionH relativeFrom="column"><wp:posOffset>0</wp:posOffset></wp:positionH>"#,
                r#"<wp:positionV relativeFrom="paragraph"><wp:posOffset>0</wp:posOffset></wp:positionV>"#,
                r#"<wp:extent cx="914400" cy="457200"/><wp:effectExtent l="0" t="0" r="0" b="0"/>"#,
                r#"<wp:wrapNone/><wp:docPr id="1" name="Text Box 1"/><wp:cNvGraphicFramePr/>"#,
                r#"<a:graphic><a:graphicData uri="http://schemas.microsoft.com/office/word/2010/wordprocessingShape">"#,
                r#"<wps:wsp><wps:cNvSpPr txBox="1"/><wps:spPr/><wps:txbx><w:txbxContent>{}</w:txbxContent></wps:txbx>"#,
                r#"<wps:bodyPr/></wps:wsp></a:graphicData></a:graphic></wp:anchor></w:drawing></w:r>"#,
            ),
            inner
        )
    }

    #[test]
    fn paragraphs_and_headings() {
        let html = html(concat!(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Intro</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t xml:space="preserve">Hello </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>world</w:t></w:r></w:p>"#,
        ));
        assert_eq!(html, "<h1>Intro</h1><p>Hello <strong>world</strong></p>");
    }

    #[test]
    fn list_paragraphs_are_grouped() {
        let item = |t: &str| {
            format!(
                r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr><w:r><w:t>{t}</w:t></w:r></w:p>"#
            )
        };
        let body = format!("{}{}<w:p><w:r><w:t>after</w:t></w:r></w:p>", item("a"), item("b"));
        assert_eq!(html(&body), "<ul><li>a</li><li>b</li></ul><p>after</p>");
    }

    #[test]
    fn tables_and_escaping() {
        let html = html(concat!(
            "<w:tbl><w:tr>",
            "<w:tc><w:p><w:r><w:t>a &amp; b</w:t></w:r></w:p></w:tc>",
            "<w:tc><w:p><w:r><w:t>&lt;c&gt;</w:t></w:r></w:p></w:tc>",
            "</w:tr></w:tbl>",
        ));
        assert_eq!(
            html,
            "<table><tr><td><p>a &amp; b</p></td><td><p>&lt;c&gt;</p></td></tr></table>"
        );
    }

    #[test]
    fn bold_off_value_respected() {
        let html = html(r#"<w:p><w:r><w:rPr><w:b w:val="0"/></w:rPr><w:t>plain</w:t></w:r></w:p>"#);
        assert_eq!(html, "<p>plain</p>");
    }

    #[test]
    fn text_box_keeps_the_surrounding_paragraph() {
        let body = format!(
            r#"<w:p><w:r><w:t xml:space="preserve">Hello </w:t></w:r>{}<w:r><w:t>after</w:t></w:r></w:p><w:p><w:r><w:t>next</w:t></w:r></w:p>"#,
            text_box("<w:p><w:r><w:t>box</w:t></w:r></w:p>")
        );
        let html = html(&body);
        assert!(html.starts_with("<p>Hello after</p>"), "got: {html}");
        assert_eq!(html.matches("box").count(), 1, "got: {html}");
        assert!(html.ends_with("<p>next</p>"), "got: {html}");
    }

    #[test]
    fn page_breaks_split_pages() {
        let html = html(concat!(
            r#"<w:p><w:r><w:t>one</w:t><w:br w:type="page"/></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>two</w:t></w:r></w:p>"#,
        ));
        assert_eq!(
            html,
            r#"<p>one</p><div class="page-break"></div><p>two</p>"#
        );
    }

    #[test]
    fn corrupt_input_is_render_failure() {
        let err = DocxToHtml.convert(b"PK\x03\x04 definitely not a zip").unwrap_err();
        assert!(matches!(err, FileError::RenderFailure { .. }));
    }

    #[test]
    fn zip_without_a_document_is_render_failure() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("other.xml", SimpleFileOptions::default()).unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        let err = DocxToHtml.convert(&bytes).unwrap_err();
        assert!(err.to_string().contains("unreadable DOCX"), "got: {err}");
    }

    #[test]
    fn heading_styles() {
        assert_eq!(heading_level("Heading2"), Some(2));
        assert_eq!(heading_level("heading 3"), Some(3));
        assert_eq!(heading_level("Title"), Some(1));
        assert_eq!(heading_level("Normal"), None);
    }
}
