//! Paginated PDF rendition of the minutes.
//!
//! Layout is computed up front into [`PdfLayout`] (pure geometry, no I/O) and only then written
//! with `printpdf`, using the built-in Helvetica faces so no font files are needed.

use crate::render::RenderError;
use crate::render::markdown::{self, Segment};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};

/// A4 width.
pub const PAGE_WIDTH_MM: f32 = 210.0;
/// A4 height.
pub const PAGE_HEIGHT_MM: f32 = 297.0;
/// Left, right, and top margin.
pub const MARGIN_MM: f32 = 10.0;
/// Space kept free at the bottom before breaking to a new page.
pub const PAGE_BREAK_MARGIN_MM: f32 = 15.0;
/// Height of every flowed line.
pub const LINE_HEIGHT_MM: f32 = 10.0;
/// Title font size in points.
pub const TITLE_SIZE_PT: f32 = 16.0;
/// Body font size in points.
pub const BODY_SIZE_PT: f32 = 14.0;
/// Document title, centered at the top of the first page.
pub const TITLE: &str = "Meeting Minutes";

const PT_TO_MM: f32 = 0.352_778;
const TEXT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;

/// Font face used for a placed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    /// Helvetica.
    Regular,
    /// Helvetica-Bold.
    Bold,
}

/// A single line of text at a fixed position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    /// Text drawn on the line.
    pub text: String,
    /// Face used to draw it.
    pub weight: Weight,
    /// Font size in points.
    pub size: f32,
    /// Distance from the left page edge, in millimetres.
    pub x: f32,
    /// Distance from the top page edge to the top of the line box, in millimetres.
    pub top: f32,
}

impl PlacedText {
    fn baseline_from_bottom(&self) -> f32 {
        let baseline_from_top = self.top + LINE_HEIGHT_MM / 2.0 + 0.3 * self.size * PT_TO_MM;
        PAGE_HEIGHT_MM - baseline_from_top
    }
}

/// All lines placed on one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfPage {
    /// Lines in drawing order.
    pub items: Vec<PlacedText>,
}

/// A flowed body block: one run of the source, possibly wrapped over several lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfBlock {
    /// Face of the whole block.
    pub weight: Weight,
    /// Unwrapped block text.
    pub text: String,
}

/// Fully paginated PDF content.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfLayout {
    /// Pages in order; the first one carries the title.
    pub pages: Vec<PdfPage>,
    /// Body blocks in flow order, excluding the title.
    pub blocks: Vec<PdfBlock>,
}

impl PdfLayout {
    /// Lay out model output: title first, then every run as its own block.
    pub fn build(minutes: &str) -> Self {
        let mut cursor = Cursor::new();

        let title_width = text_width_mm(TITLE, Weight::Bold, TITLE_SIZE_PT);
        cursor.place(PlacedText {
            text: TITLE.to_string(),
            weight: Weight::Bold,
            size: TITLE_SIZE_PT,
            x: ((PAGE_WIDTH_MM - title_width) / 2.0).max(MARGIN_MM),
            top: MARGIN_MM,
        });
        cursor.top = MARGIN_MM + 2.0 * LINE_HEIGHT_MM;

        let mut blocks = Vec::new();
        for line in markdown::layout(minutes) {
            for Segment { text, emphasized } in line.segments {
                let weight = if emphasized {
                    Weight::Bold
                } else {
                    Weight::Regular
                };
                let printable = printable_text(&text);
                for wrapped in wrap(&printable, weight, BODY_SIZE_PT, TEXT_WIDTH_MM) {
                    cursor.flow(wrapped, weight, BODY_SIZE_PT);
                }
                blocks.push(PdfBlock {
                    weight,
                    text: printable,
                });
            }
        }

        Self {
            pages: cursor.pages,
            blocks,
        }
    }

    /// Number of body blocks drawn in bold.
    pub fn bold_blocks(&self) -> usize {
        self.blocks
            .iter()
            .filter(|block| block.weight == Weight::Bold)
            .count()
    }

    /// Serialize the layout into PDF bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RenderError> {
        let (doc, first_page, first_layer) = PdfDocument::new(
            TITLE,
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Layer 1",
        );
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;

        for (index, page) in self.pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page_index, layer_index) =
                    doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
                doc.get_page(page_index).get_layer(layer_index)
            };
            for item in &page.items {
                let font: &IndirectFontRef = match item.weight {
                    Weight::Regular => &regular,
                    Weight::Bold => &bold,
                };
                layer.use_text(
                    item.text.clone(),
                    item.size,
                    Mm(item.x),
                    Mm(item.baseline_from_bottom()),
                    font,
                );
            }
        }

        doc.save_to_bytes().map_err(pdf_error)
    }
}

fn pdf_error<E: std::fmt::Debug>(error: E) -> RenderError {
    RenderError::Pdf(format!("{error:?}"))
}

struct Cursor {
    pages: Vec<PdfPage>,
    top: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![PdfPage::default()],
            top: MARGIN_MM,
        }
    }

    fn place(&mut self, item: PlacedText) {
        if let Some(page) = self.pages.last_mut() {
            page.items.push(item);
        }
    }

    fn flow(&mut self, text: String, weight: Weight, size: f32) {
        if self.top + LINE_HEIGHT_MM > PAGE_HEIGHT_MM - PAGE_BREAK_MARGIN_MM {
            self.pages.push(PdfPage::default());
            self.top = MARGIN_MM;
        }
        let top = self.top;
        self.place(PlacedText {
            text,
            weight,
            size,
            x: MARGIN_MM,
            top,
        });
        self.top += LINE_HEIGHT_MM;
    }
}

/// Map typographic punctuation to ASCII and replace anything else the built-in fonts cannot show.
fn printable_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2022}' => out.push('*'),
            '\u{2026}' => out.push_str("..."),
            '\t' => out.push(' '),
            ch if ch.is_ascii() && !ch.is_ascii_control() => out.push(ch),
            _ => out.push('?'),
        }
    }
    out
}

/// Helvetica advance widths for `' '..='~'`, in 1/1000 em (Adobe AFM).
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advance widths, same layout.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn char_width_em(ch: char, weight: Weight) -> f32 {
    let widths = match weight {
        Weight::Regular => &HELVETICA_WIDTHS,
        Weight::Bold => &HELVETICA_BOLD_WIDTHS,
    };
    let units = (ch as u32)
        .checked_sub(u32::from(' '))
        .and_then(|index| widths.get(index as usize))
        .copied()
        .unwrap_or(widths[usize::from(b'?' - b' ')]);
    f32::from(units) / 1000.0
}

fn text_width_mm(text: &str, weight: Weight, size: f32) -> f32 {
    text.chars()
        .map(|ch| char_width_em(ch, weight))
        .sum::<f32>()
        * size
        * PT_TO_MM
}

/// Greedy word wrap; words wider than a full line are broken by character.
fn wrap(text: &str, weight: Weight, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width_mm(&candidate, weight, size) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if text_width_mm(word, weight, size) <= max_width {
            current = word.to_string();
            continue;
        }
        for ch in word.chars() {
            current.push(ch);
            if text_width_mm(&current, weight, size) > max_width && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::replace(&mut current, ch.to_string()));
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_items(layout: &PdfLayout) -> Vec<&PlacedText> {
        layout
            .pages
            .iter()
            .flat_map(|page| page.items.iter())
            .skip(1)
            .collect()
    }

    #[test]
    fn action_items_example_has_one_bold_and_two_plain_blocks() {
        let layout =
            PdfLayout::build("Alice: We shipped v2.\n**Action Items**\n- Bob to follow up");
        assert_eq!(layout.bold_blocks(), 1);
        assert_eq!(layout.blocks.len(), 3);
        assert_eq!(
            layout.blocks[1],
            PdfBlock {
                weight: Weight::Bold,
                text: "Action Items".into()
            }
        );
        assert_eq!(layout.blocks[0].weight, Weight::Regular);
        assert_eq!(layout.blocks[2].text, "- Bob to follow up");
    }

    #[test]
    fn title_is_centered_bold_on_first_page() {
        let layout = PdfLayout::build("body");
        let title = &layout.pages[0].items[0];
        assert_eq!(title.text, TITLE);
        assert_eq!(title.weight, Weight::Bold);
        assert_eq!(title.size, TITLE_SIZE_PT);
        let width = text_width_mm(TITLE, Weight::Bold, TITLE_SIZE_PT);
        assert!((title.x + width / 2.0 - PAGE_WIDTH_MM / 2.0).abs() < 0.01);
        assert_eq!(body_items(&layout)[0].top, MARGIN_MM + 2.0 * LINE_HEIGHT_MM);
    }

    #[test]
    fn long_content_breaks_onto_new_pages_within_margin() {
        let minutes: String = (0..60).map(|i| format!("Line {i}\n")).collect();
        let layout = PdfLayout::build(&minutes);
        assert!(layout.pages.len() >= 3);
        for page in &layout.pages {
            for item in &page.items {
                assert!(item.top + LINE_HEIGHT_MM <= PAGE_HEIGHT_MM - PAGE_BREAK_MARGIN_MM);
            }
        }
        assert_eq!(layout.pages[1].items[0].top, MARGIN_MM);
    }

    #[test]
    fn long_block_wraps_inside_text_width() {
        let sentence = "the quick brown fox jumps over the lazy dog ".repeat(12);
        let lines = wrap(&sentence, Weight::Regular, BODY_SIZE_PT, TEXT_WIDTH_MM);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width_mm(line, Weight::Regular, BODY_SIZE_PT) <= TEXT_WIDTH_MM);
        }
        let rejoined = lines.join(" ");
        assert_eq!(rejoined, sentence.trim_end());
    }

    #[test]
    fn glyph_widths_follow_font_metrics() {
        assert_eq!(char_width_em('W', Weight::Regular), 0.944);
        assert_eq!(char_width_em('i', Weight::Regular), 0.222);
        assert_eq!(char_width_em('m', Weight::Bold), 0.889);
        assert_eq!(char_width_em('b', Weight::Bold), 0.611);
        assert_eq!(char_width_em('~', Weight::Bold), 0.584);
    }

    #[test]
    fn wide_bold_glyph_lines_stay_inside_text_width() {
        let heavy = "WWW MMM mmm www @@@ ".repeat(20);
        for weight in [Weight::Regular, Weight::Bold] {
            let lines = wrap(&heavy, weight, BODY_SIZE_PT, TEXT_WIDTH_MM);
            assert!(lines.len() > 1);
            for line in &lines {
                assert!(text_width_mm(line, weight, BODY_SIZE_PT) <= TEXT_WIDTH_MM);
            }
        }
    }

    #[test]
    fn overlong_word_is_split_by_character() {
        let word = "x".repeat(400);
        let lines = wrap(&word, Weight::Bold, BODY_SIZE_PT, TEXT_WIDTH_MM);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn empty_emphasis_still_occupies_a_line() {
        assert_eq!(wrap("", Weight::Bold, BODY_SIZE_PT, TEXT_WIDTH_MM), vec![String::new()]);
        let layout = PdfLayout::build("****");
        assert_eq!(layout.bold_blocks(), 1);
    }

    #[test]
    fn typographic_characters_are_made_printable() {
        assert_eq!(printable_text("Bob\u{2019}s \u{201C}plan\u{201D} \u{2014} ok\u{2026}"), "Bob's \"plan\" - ok...");
        assert_eq!(printable_text("caf\u{e9}"), "caf?");
    }

    #[test]
    fn serialized_output_is_a_pdf() {
        let bytes = PdfLayout::build("**Attendees**\nAlice")
            .to_bytes()
            .expect("pdf bytes");
        assert!(bytes.starts_with(b"%PDF"));
    }
}
