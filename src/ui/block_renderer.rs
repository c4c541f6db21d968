//! Block rendering for the preview
//!
//! Draws parsed markdown blocks with egui widgets. Heading positions are
//! reported to the scroll-spy while drawing.

use std::path::Path;

use eframe::egui::{self, Align, Color32, FontId, RichText, Ui};

use super::markdown_blocks::{InlineSpan, ListItem, ParsedBlock, TableAlignment};
use crate::core::scroll_spy::ScrollSpy;

/// Action that can be triggered by block interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockAction {
    /// Jump to a heading of the current document
    ScrollTo(String),
    /// Open external URL
    OpenUrl(String),
}

impl BlockAction {
    fn for_link(url: &str) -> Self {
        match url.strip_prefix('#') {
            Some(anchor) => BlockAction::ScrollTo(anchor.to_string()),
            None => BlockAction::OpenUrl(url.to_string()),
        }
    }
}

/// State shared by all blocks drawn in one frame
pub struct RenderContext<'a> {
    pub spy: &'a mut ScrollSpy,
    /// Screen position of the scroll container's top edge
    pub viewport_top: f32,
    /// Directory used to resolve relative image paths
    pub base_dir: Option<&'a Path>,
    heading_index: usize,
    action: Option<BlockAction>,
}

impl<'a> RenderContext<'a> {
    pub fn new(spy: &'a mut ScrollSpy, viewport_top: f32, base_dir: Option<&'a Path>) -> Self {
        Self {
            spy,
            viewport_top,
            base_dir,
            heading_index: 0,
            action: None,
        }
    }

    /// Action triggered by a click this frame, if any
    pub fn take_action(&mut self) -> Option<BlockAction> {
        self.action.take()
    }
}

/// Render a list of blocks
pub fn render_blocks(ui: &mut Ui, blocks: &[ParsedBlock], cx: &mut RenderContext) {
    for block in blocks {
        render_block(ui, block, cx);
    }
}

/// Render a parsed block to the UI
pub fn render_block(ui: &mut Ui, block: &ParsedBlock, cx: &mut RenderContext) {
    match block {
        ParsedBlock::Heading { level, text, id } => render_heading(ui, *level, text, id, cx),
        ParsedBlock::Paragraph { spans } => {
            render_spans(ui, spans, cx);
            ui.add_space(8.0);
        }
        ParsedBlock::CodeBlock { lang, code } => render_code_block(ui, lang.as_deref(), code),
        ParsedBlock::List { items, start } => render_list(ui, items, *start, cx),
        ParsedBlock::BlockQuote { content } => render_blockquote(ui, content, cx),
        ParsedBlock::HorizontalRule => render_horizontal_rule(ui),
        ParsedBlock::Table {
            alignments,
            headers,
            rows,
        } => render_table(ui, alignments, headers, rows),
        ParsedBlock::Image { alt, url, title } => {
            render_image(ui, alt, url, title.as_deref(), cx.base_dir)
        }
        ParsedBlock::Html { html } => render_code_block(ui, Some("html"), html),
    }
}

/// Render a heading and report its position
pub fn render_heading(ui: &mut Ui, level: u8, text: &str, id: &str, cx: &mut RenderContext) {
    let font_size = match level {
        1 => 28.0,
        2 => 24.0,
        3 => 20.0,
        4 => 18.0,
        5 => 16.0,
        _ => 14.0,
    };

    ui.add_space(if level <= 2 { 8.0 } else { 4.0 });

    let response = ui.label(
        RichText::new(text)
            .font(FontId::proportional(font_size))
            .strong(),
    );

    cx.spy
        .record(cx.heading_index, response.rect.top() - cx.viewport_top);
    cx.heading_index += 1;

    if cx.spy.take_target(id) {
        response.scroll_to_me(Some(Align::TOP));
    }

    if level <= 2 {
        ui.separator();
    }

    // Add spacing after heading
    ui.add_space(match level {
        1 => 8.0,
        2 => 6.0,
        _ => 4.0,
    });
}

/// Render styled inline spans as wrapped text
pub fn render_spans(ui: &mut Ui, spans: &[InlineSpan], cx: &mut RenderContext) {
    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing.x = 0.0;

        for span in spans {
            let mut text = RichText::new(&span.text);
            if span.style.strong {
                text = text.strong();
            }
            if span.style.emphasis {
                text = text.italics();
            }
            if span.style.strikethrough {
                text = text.strikethrough();
            }
            if span.style.code {
                text = text.code();
            }

            match &span.link {
                Some(url) => {
                    let response = ui.link(text).on_hover_text(url);
                    if response.clicked() {
                        cx.action = Some(BlockAction::for_link(url));
                    }
                }
                None => {
                    ui.label(text);
                }
            }
        }
    });
}

/// Render a code block
pub fn render_code_block(ui: &mut Ui, lang: Option<&str>, code: &str) {
    let visuals = ui.visuals();
    let bg_color = visuals.code_bg_color;
    let border = visuals.widgets.noninteractive.bg_stroke;
    let label_color = visuals.weak_text_color();

    egui::Frame::new()
        .fill(bg_color)
        .stroke(border)
        .inner_margin(egui::Margin::same(8))
        .outer_margin(egui::Margin::symmetric(0, 4))
        .corner_radius(4.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());

            // Language label
            if let Some(lang) = lang {
                ui.label(
                    RichText::new(lang)
                        .font(FontId::monospace(12.0))
                        .color(label_color),
                );
                ui.add_space(4.0);
            }

            ui.label(RichText::new(code.trim_end_matches('\n')).font(FontId::monospace(14.0)));
        });

    ui.add_space(8.0);
}

/// Render a list (ordered or unordered)
pub fn render_list(ui: &mut Ui, items: &[ListItem], start: Option<u64>, cx: &mut RenderContext) {
    let marker_color = ui.visuals().weak_text_color();

    for (idx, item) in items.iter().enumerate() {
        ui.horizontal(|ui| {
            // Indent
            ui.add_space(16.0);

            let marker = match (item.checkbox, start) {
                (Some(true), _) => "\u{2611}".to_string(),
                (Some(false), _) => "\u{2610}".to_string(),
                (None, Some(first)) => format!("{}.", first + idx as u64),
                (None, None) => "\u{2022}".to_string(),
            };
            ui.label(RichText::new(marker).color(marker_color));
            ui.add_space(4.0);

            ui.vertical(|ui| {
                if !item.spans.is_empty() {
                    render_spans(ui, &item.spans, cx);
                }
                // Nested blocks
                render_blocks(ui, &item.children, cx);
            });
        });
    }

    ui.add_space(8.0);
}

/// Render a blockquote
pub fn render_blockquote(ui: &mut Ui, content: &[ParsedBlock], cx: &mut RenderContext) {
    let bar_color = ui.visuals().widgets.noninteractive.bg_stroke.color;

    let response = egui::Frame::new()
        .fill(ui.visuals().faint_bg_color)
        .inner_margin(egui::Margin {
            left: 14,
            right: 8,
            top: 6,
            bottom: 6,
        })
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            render_blocks(ui, content, cx);
        })
        .response;

    // Left border
    let rect = response.rect;
    ui.painter().rect_filled(
        egui::Rect::from_min_size(rect.min, egui::vec2(4.0, rect.height())),
        0.0,
        bar_color,
    );

    ui.add_space(8.0);
}

/// Render a horizontal rule
pub fn render_horizontal_rule(ui: &mut Ui) {
    ui.add_space(8.0);
    ui.separator();
    ui.add_space(8.0);
}

/// Render a table
pub fn render_table(
    ui: &mut Ui,
    alignments: &[TableAlignment],
    headers: &[String],
    rows: &[Vec<String>],
) {
    use egui_extras::{Column, TableBuilder};

    let num_cols = headers.len().max(1);
    let layout_for = |col: usize| {
        let align = match alignments.get(col).copied().unwrap_or_default() {
            TableAlignment::Left => Align::Min,
            TableAlignment::Center => Align::Center,
            TableAlignment::Right => Align::Max,
        };
        egui::Layout::left_to_right(Align::Center).with_main_align(align)
    };

    // Several tables can share one scroll area
    let table_id = ui.next_auto_id();
    ui.push_id(table_id, |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .columns(Column::auto().at_least(60.0), num_cols)
            .header(22.0, |mut header| {
                for (col, cell) in headers.iter().enumerate() {
                    header.col(|ui| {
                        ui.with_layout(layout_for(col), |ui| {
                            ui.strong(cell);
                        });
                    });
                }
            })
            .body(|mut body| {
                for row in rows {
                    body.row(20.0, |mut row_ui| {
                        for col in 0..num_cols {
                            let cell = row.get(col).map(String::as_str).unwrap_or("");
                            row_ui.col(|ui| {
                                ui.with_layout(layout_for(col), |ui| {
                                    ui.label(cell);
                                });
                            });
                        }
                    });
                }
            });
    });

    ui.add_space(8.0);
}

/// Resolve an image reference to a URI the image loaders understand
pub fn image_uri(url: &str, base_dir: Option<&Path>) -> String {
    if url.contains("://") || url.starts_with("data:") {
        return url.to_string();
    }

    let path = Path::new(url);
    let resolved = match base_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    };
    format!("file://{}", resolved.display())
}

/// Render an image
pub fn render_image(
    ui: &mut Ui,
    alt: &str,
    url: &str,
    title: Option<&str>,
    base_dir: Option<&Path>,
) {
    let uri = image_uri(url, base_dir);
    let max_width = ui.available_width();

    let response = ui.add(
        egui::Image::new(uri)
            .max_width(max_width)
            .fit_to_original_size(1.0),
    );
    if let Some(title) = title {
        response.on_hover_text(title);
    }

    if !alt.is_empty() {
        ui.label(RichText::new(alt).italics().color(Color32::GRAY).small());
    }

    ui.add_space(8.0);
}
