//! Markdown editor panel

use eframe::egui;

use crate::app::PreviewApp;

/// Markdown editor panel
pub struct EditorPanel;

impl EditorPanel {
    /// Show the editor panel
    pub fn show(ui: &mut egui::Ui, app: &mut PreviewApp) {
        egui::ScrollArea::vertical()
            .id_salt("editor_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let response = egui::TextEdit::multiline(&mut app.document.content)
                    .font(egui::TextStyle::Monospace)
                    .code_editor()
                    .hint_text("Type markdown here...")
                    .desired_width(f32::INFINITY)
                    .desired_rows(30)
                    .show(ui);

                // Every edit re-renders the preview on the next frame
                if response.response.changed() {
                    app.document.modified = true;
                    app.render_dirty = true;
                }
            });
    }
}
