//! Scroll-position tracking for the preview
//!
//! Heading positions are measured relative to the top edge of the scroll
//! container. The active heading is the last one (in document order) that has
//! scrolled to or above a lookahead line a fixed distance below that edge.

/// Distance below the container top at which a heading becomes active
pub const DEFAULT_LOOKAHEAD: f32 = 150.0;

/// Index of the active heading, scanning from the end of the document
pub fn active_heading(positions: &[f32], lookahead: f32) -> Option<usize> {
    positions.iter().rposition(|&y| y <= lookahead)
}

/// Scroll progress in percent
pub fn scroll_progress(offset: f32, content_height: f32, viewport_height: f32) -> f32 {
    let scrollable = content_height - viewport_height;
    if scrollable <= 0.0 {
        return 100.0;
    }
    (offset / scrollable * 100.0).clamp(0.0, 100.0)
}

/// Heading list of the current render plus the positions measured this frame
#[derive(Debug, Default)]
pub struct ScrollSpy {
    ids: Vec<String>,
    positions: Vec<Option<f32>>,
    progress: f32,
    pending_target: Option<String>,
}

impl ScrollSpy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached heading list after a re-render
    pub fn reset(&mut self, ids: Vec<String>) {
        self.positions = vec![None; ids.len()];
        self.ids = ids;
        self.progress = 0.0;
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Forget the positions of the previous frame
    pub fn begin_frame(&mut self) {
        self.positions.iter_mut().for_each(|p| *p = None);
    }

    /// Store the position of heading `index` relative to the container top
    pub fn record(&mut self, index: usize, y: f32) {
        if let Some(slot) = self.positions.get_mut(index) {
            *slot = Some(y);
        }
    }

    pub fn set_progress(&mut self, offset: f32, content_height: f32, viewport_height: f32) {
        self.progress = scroll_progress(offset, content_height, viewport_height);
    }

    /// Last computed scroll progress in percent
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Index of the active heading among the ones measured this frame
    pub fn active(&self, lookahead: f32) -> Option<usize> {
        // Headings that were not laid out this frame sit below the viewport
        let positions: Vec<f32> = self
            .positions
            .iter()
            .map(|p| p.unwrap_or(f32::INFINITY))
            .collect();
        active_heading(&positions, lookahead)
    }

    pub fn active_id(&self, lookahead: f32) -> Option<&str> {
        self.active(lookahead)
            .and_then(|idx| self.ids.get(idx))
            .map(String::as_str)
    }

    /// Ask the preview to bring a heading into view
    pub fn scroll_to(&mut self, id: impl Into<String>) {
        self.pending_target = Some(id.into());
    }

    /// Take the pending target if it matches the heading being drawn
    pub fn take_target(&mut self, id: &str) -> bool {
        if self.pending_target.as_deref() == Some(id) {
            self.pending_target = None;
            true
        } else {
            false
        }
    }
}
