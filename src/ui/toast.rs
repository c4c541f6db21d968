//! Transient notifications shown in the bottom-right corner

use std::time::{Duration, Instant};

use eframe::egui::{self, Align2, Color32, RichText};

use crate::core::convert::Notify;

const INFO_TTL: Duration = Duration::from_secs(3);
const ERROR_TTL: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    expires_at: Instant,
}

/// Stack of auto-dismissed notifications
#[derive(Debug, Default)]
pub struct Toasts {
    toasts: Vec<Toast>,
}

impl Toasts {
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Info, message.into(), INFO_TTL);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Error, message.into(), ERROR_TTL);
    }

    fn push(&mut self, kind: ToastKind, message: String, ttl: Duration) {
        self.toasts.push(Toast {
            kind,
            message,
            expires_at: Instant::now() + ttl,
        });
    }

    /// Drop expired toasts
    pub fn prune(&mut self, now: Instant) {
        self.toasts.retain(|toast| toast.expires_at > now);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Draw the active toasts and schedule a repaint for the next expiry
    pub fn show(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        self.prune(now);

        if self.is_empty() {
            return;
        }
        let Some(next_expiry) = self.iter().map(|t| t.expires_at).min() else {
            return;
        };
        ctx.request_repaint_after(next_expiry.saturating_duration_since(now));

        egui::Area::new(egui::Id::new("toasts"))
            .anchor(Align2::RIGHT_BOTTOM, [-12.0, -36.0])
            .order(egui::Order::Foreground)
            .interactable(false)
            .show(ctx, |ui| {
                for toast in self.iter() {
                    let (fill, text_color) = match toast.kind {
                        ToastKind::Info => (ui.visuals().extreme_bg_color, ui.visuals().text_color()),
                        ToastKind::Error => (Color32::from_rgb(120, 30, 30), Color32::WHITE),
                    };

                    egui::Frame::popup(ui.style())
                        .fill(fill)
                        .show(ui, |ui| {
                            ui.set_max_width(360.0);
                            ui.label(RichText::new(&toast.message).color(text_color));
                        });
                    ui.add_space(4.0);
                }
            });
    }
}

impl Notify for Toasts {
    fn error(&mut self, message: String) {
        Toasts::error(self, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toasts_expire() {
        let mut toasts = Toasts::default();
        toasts.info("Copied");
        toasts.error("Failed");
        assert_eq!(toasts.iter().count(), 2);

        toasts.prune(Instant::now() + INFO_TTL + Duration::from_millis(1));
        let left: Vec<_> = toasts.iter().map(|t| t.kind).collect();
        assert_eq!(left, [ToastKind::Error]);

        toasts.prune(Instant::now() + ERROR_TTL + Duration::from_millis(1));
        assert!(toasts.is_empty());
    }

    #[test]
    fn test_notify_sink_records_errors() {
        let mut toasts = Toasts::default();
        Notify::error(&mut toasts, "Rendering failed".to_string());
        let toast = toasts.iter().next().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.message, "Rendering failed");
    }
}
