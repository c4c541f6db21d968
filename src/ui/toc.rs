//! Table of contents panel

use eframe::egui::{self, RichText};

use super::markdown_blocks::OutlineEntry;

/// Table of contents for the rendered document
pub struct TocPanel;

impl TocPanel {
    /// Show the outline; returns the id of a clicked heading
    pub fn show(ui: &mut egui::Ui, entries: &[OutlineEntry], active: Option<&str>) -> Option<String> {
        let mut clicked = None;

        ui.heading("Contents");
        ui.separator();

        if entries.is_empty() {
            ui.label(RichText::new("No headings").weak());
            return None;
        }

        let min_level = entries.iter().map(|e| e.level).min().unwrap_or(1);

        egui::ScrollArea::vertical()
            .id_salt("toc_scroll")
            .show(ui, |ui| {
                for entry in entries {
                    ui.horizontal(|ui| {
                        ui.add_space(indent(entry.level, min_level));

                        let is_active = active == Some(entry.id.as_str());
                        let label = if entry.text.is_empty() {
                            RichText::new("(untitled)").italics()
                        } else {
                            RichText::new(&entry.text)
                        };

                        if ui.selectable_label(is_active, label).clicked() {
                            clicked = Some(entry.id.clone());
                        }
                    });
                }
            });

        clicked
    }
}

fn indent(level: u8, min_level: u8) -> f32 {
    f32::from(level.saturating_sub(min_level)) * 12.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_relative_to_top_level() {
        assert_eq!(indent(2, 2), 0.0);
        assert_eq!(indent(4, 2), 24.0);
        assert_eq!(indent(1, 2), 0.0);
    }
}
