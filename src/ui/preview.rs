//! Rendered markdown preview

use std::path::Path;

use eframe::egui::{self, Color32, RichText};

use super::block_renderer::{render_blocks, BlockAction, RenderContext};
use super::markdown_blocks::{OutlineEntry, ParsedBlock};
use super::toast::Toasts;
use crate::app::PreviewApp;
use crate::core::scroll_spy::ScrollSpy;

/// Output of one render of the document
#[derive(Debug, Default)]
pub struct Rendered {
    /// HTML from the conversion engine (or the error fallback)
    pub html: String,
    pub blocks: Vec<ParsedBlock>,
    pub outline: Vec<OutlineEntry>,
    /// Error message when conversion failed
    pub failed: Option<String>,
}

/// Ask the preview to bring heading `id` into view on its next frame.
/// Unknown anchors raise an error toast instead.
pub fn request_heading(spy: &mut ScrollSpy, toasts: &mut Toasts, id: &str) -> bool {
    if spy.ids().iter().any(|known| known == id) {
        spy.scroll_to(id);
        true
    } else {
        toasts.error(format!("No heading with anchor #{id}"));
        false
    }
}

/// Markdown preview panel
pub struct PreviewPanel;

impl PreviewPanel {
    /// Show the preview panel
    pub fn show(ui: &mut egui::Ui, app: &mut PreviewApp) {
        if app.converter.is_none() {
            Self::show_message(ui, "No markdown engine loaded");
            return;
        }

        if let Some(error) = &app.rendered.failed {
            Self::show_failure(ui, error);
            return;
        }

        if app.rendered.blocks.is_empty() {
            Self::show_empty(ui);
            return;
        }

        ui.add(egui::ProgressBar::new(app.spy.progress() / 100.0).desired_height(3.0));

        let base_dir = app.document.path().and_then(Path::parent);
        let blocks = &app.rendered.blocks;
        let spy = &mut app.spy;
        spy.begin_frame();

        let output = egui::ScrollArea::vertical()
            .id_salt("preview_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let viewport_top = ui.clip_rect().top();
                let mut cx = RenderContext::new(spy, viewport_top, base_dir);

                egui::Frame::new()
                    .inner_margin(egui::Margin::symmetric(16, 8))
                    .show(ui, |ui| render_blocks(ui, blocks, &mut cx));

                cx.take_action()
            });

        app.spy.set_progress(
            output.state.offset.y,
            output.content_size.y,
            output.inner_rect.height(),
        );

        match output.inner {
            Some(BlockAction::ScrollTo(id)) => {
                request_heading(&mut app.spy, &mut app.toasts, &id);
            }
            Some(BlockAction::OpenUrl(url)) => {
                tracing::info!("Opening link: {}", url);
                ui.ctx().open_url(egui::OpenUrl::new_tab(url));
            }
            None => {}
        }
    }

    /// Inline replacement for a document that failed to render
    fn show_failure(ui: &mut egui::Ui, error: &str) {
        egui::Frame::new()
            .stroke(egui::Stroke::new(1.0, Color32::from_rgb(200, 60, 60)))
            .inner_margin(egui::Margin::same(12))
            .outer_margin(egui::Margin::same(16))
            .show(ui, |ui| {
                ui.label(
                    RichText::new("Error")
                        .strong()
                        .color(Color32::from_rgb(220, 80, 80)),
                );
                ui.label(RichText::new(error).monospace());
            });
    }

    fn show_message(ui: &mut egui::Ui, message: &str) {
        ui.vertical_centered(|ui| {
            ui.add_space(50.0);
            ui.label(RichText::new(message).weak());
        });
    }

    /// Show empty state
    fn show_empty(ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(50.0);
            ui.heading("Nothing to preview");
            ui.add_space(10.0);
            ui.label("Open a markdown file (Ctrl+O), drop one onto the window,");
            ui.label("or load the built-in example from the File menu.");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::toast::ToastKind;

    fn spy_with(ids: &[&str]) -> ScrollSpy {
        let mut spy = ScrollSpy::new();
        spy.reset(ids.iter().map(|id| id.to_string()).collect());
        spy
    }

    #[test]
    fn test_known_heading_becomes_scroll_target() {
        let mut spy = spy_with(&["intro", "setup", "setup-1"]);
        let mut toasts = Toasts::default();

        assert!(request_heading(&mut spy, &mut toasts, "setup-1"));
        assert!(toasts.is_empty());

        assert!(!spy.take_target("setup"));
        assert!(spy.take_target("setup-1"));
        // Consumed once the heading is drawn
        assert!(!spy.take_target("setup-1"));
    }

    #[test]
    fn test_unknown_anchor_raises_error_toast() {
        let mut spy = spy_with(&["intro"]);
        let mut toasts = Toasts::default();

        assert!(!request_heading(&mut spy, &mut toasts, "missing"));
        assert!(!spy.take_target("missing"));
        assert!(!spy.take_target("intro"));

        let toast = toasts.iter().next().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert!(toast.message.contains("#missing"));
    }

    #[test]
    fn test_later_request_replaces_pending_target() {
        let mut spy = spy_with(&["a", "b"]);
        let mut toasts = Toasts::default();

        request_heading(&mut spy, &mut toasts, "a");
        request_heading(&mut spy, &mut toasts, "b");
        assert!(!spy.take_target("a"));
        assert!(spy.take_target("b"));
    }
}
