//! WordprocessingML (`.docx`) rendition of the minutes.

use crate::render::RenderError;
use crate::render::markdown;
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use zip::CompressionMethod;
use zip::write::FileOptions;

/// Heading placed at the top of every document.
pub const TITLE: &str = "Meeting Minutes";
/// Font applied to every paragraph style.
pub const FONT_NAME: &str = "Calibri";
/// Font size applied to every paragraph style, in points.
pub const FONT_SIZE_PT: u32 = 12;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const WORD_NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// A styled run inside a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxRun {
    /// Run text.
    pub text: String,
    /// Whether the run is bold.
    pub bold: bool,
}

/// One paragraph of the output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxParagraph {
    /// Paragraph style id, if not the default.
    pub style: Option<&'static str>,
    /// Whether the paragraph is centered.
    pub centered: bool,
    /// Runs in order.
    pub runs: Vec<DocxRun>,
}

/// In-memory document ready to be packaged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxDocument {
    /// Paragraphs in order; the first is the title.
    pub paragraphs: Vec<DocxParagraph>,
}

impl DocxDocument {
    /// Build the document: centered title, then one paragraph per non-blank line.
    pub fn build(minutes: &str) -> Self {
        let mut paragraphs = vec![DocxParagraph {
            style: Some("Title"),
            centered: true,
            runs: vec![DocxRun {
                text: TITLE.to_string(),
                bold: false,
            }],
        }];

        paragraphs.extend(markdown::layout(minutes).into_iter().map(|line| DocxParagraph {
            style: None,
            centered: false,
            runs: line
                .segments
                .into_iter()
                .map(|segment| DocxRun {
                    text: segment.text,
                    bold: segment.emphasized,
                })
                .collect(),
        }));

        Self { paragraphs }
    }

    /// Number of bold runs in the body (title excluded).
    pub fn bold_runs(&self) -> usize {
        self.paragraphs
            .iter()
            .skip(1)
            .flat_map(|paragraph| paragraph.runs.iter())
            .filter(|run| run.bold)
            .count()
    }

    /// Package the document as `.docx` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RenderError> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            ("_rels/.rels", PACKAGE_RELS.to_string()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
            ("word/styles.xml", styles_xml()),
            ("word/document.xml", self.document_xml()),
        ];
        for (name, body) in parts {
            writer.start_file(name, options)?;
            writer.write_all(body.as_bytes())?;
        }

        Ok(writer.finish()?.into_inner())
    }

    fn document_xml(&self) -> String {
        let mut xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<w:document xmlns:w=\"{WORD_NAMESPACE}\"><w:body>"
        );
        for paragraph in &self.paragraphs {
            xml.push_str("<w:p>");
            if paragraph.style.is_some() || paragraph.centered {
                xml.push_str("<w:pPr>");
                if let Some(style) = paragraph.style {
                    xml.push_str(&format!("<w:pStyle w:val=\"{style}\"/>"));
                }
                if paragraph.centered {
                    xml.push_str("<w:jc w:val=\"center\"/>");
                }
                xml.push_str("</w:pPr>");
            }
            for run in &paragraph.runs {
                xml.push_str("<w:r>");
                if run.bold {
                    xml.push_str("<w:rPr><w:b/></w:rPr>");
                }
                xml.push_str(&format!(
                    "<w:t xml:space=\"preserve\">{}</w:t></w:r>",
                    escape(run.text.as_str())
                ));
            }
            xml.push_str("</w:p>");
        }
        xml.push_str(
            "<w:sectPr><w:pgSz w:w=\"11906\" w:h=\"16838\"/><w:pgMar w:top=\"1440\" w:right=\"1440\" \
w:bottom=\"1440\" w:left=\"1440\" w:header=\"708\" w:footer=\"708\" w:gutter=\"0\"/></w:sectPr>",
        );
        xml.push_str("</w:body></w:document>");
        xml
    }
}

/// Styles part carrying the global font override for every paragraph style.
fn styles_xml() -> String {
    let half_points = FONT_SIZE_PT * 2;
    let run_properties = format!(
        "<w:rPr><w:rFonts w:ascii=\"{FONT_NAME}\" w:hAnsi=\"{FONT_NAME}\" w:cs=\"{FONT_NAME}\" w:eastAsia=\"{FONT_NAME}\"/><w:sz w:val=\"{half_points}\"/><w:szCs w:val=\"{half_points}\"/></w:rPr>"
    );
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<w:styles xmlns:w=\"{WORD_NAMESPACE}\">\
<w:docDefaults><w:rPrDefault>{run_properties}</w:rPrDefault></w:docDefaults>\
<w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\"><w:name w:val=\"Normal\"/>{run_properties}</w:style>\
<w:style w:type=\"paragraph\" w:styleId=\"Title\"><w:name w:val=\"Title\"/><w:basedOn w:val=\"Normal\"/><w:next w:val=\"Normal\"/>\
<w:pPr><w:spacing w:after=\"240\"/><w:jc w:val=\"center\"/></w:pPr>{run_properties}</w:style>\
</w:styles>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::read_docx;

    #[test]
    fn whole_line_emphasis_becomes_single_bold_run() {
        let document = DocxDocument::build("**Attendees**\nAlice, Bob");
        assert_eq!(document.paragraphs.len(), 3);
        assert_eq!(
            document.paragraphs[1].runs,
            vec![DocxRun {
                text: "Attendees".into(),
                bold: true
            }]
        );
        assert_eq!(document.bold_runs(), 1);
    }

    #[test]
    fn partial_emphasis_splits_runs_within_one_paragraph() {
        let document = DocxDocument::build("Owner: **Bob** by Friday\n\n**Next Steps**");
        assert_eq!(document.paragraphs.len(), 3);
        assert_eq!(document.paragraphs[1].runs.len(), 3);
        assert_eq!(document.bold_runs(), 2);
    }

    #[test]
    fn title_paragraph_is_centered() {
        let document = DocxDocument::build("");
        assert_eq!(document.paragraphs.len(), 1);
        let title = &document.paragraphs[0];
        assert!(title.centered);
        assert_eq!(title.style, Some("Title"));
        assert!(document.document_xml().contains("<w:jc w:val=\"center\"/>"));
    }

    #[test]
    fn packaged_document_reads_back_with_escaped_text() {
        let document = DocxDocument::build("**Q&A**\nRevenue < target & rising");
        let bytes = document.to_bytes().expect("docx bytes");
        let transcript = read_docx(std::io::Cursor::new(bytes)).expect("readable docx");
        assert_eq!(
            transcript.paragraphs(),
            ["Meeting Minutes", "Q&A", "Revenue < target & rising"]
        );
    }

    #[test]
    fn styles_apply_global_font() {
        let styles = styles_xml();
        assert!(styles.contains("w:ascii=\"Calibri\""));
        assert!(styles.contains("<w:sz w:val=\"24\"/>"));
    }
}
