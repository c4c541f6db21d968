//! Markdown to HTML conversion
//!
//! The conversion engine is looked up by name when the app starts. The
//! [`Converter`] wraps it so callers always get displayable HTML back: an
//! engine failure is reported through a [`Notify`] sink and replaced by an
//! inline error fragment.

use std::any::Any;
use std::panic;

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use thiserror::Error;

use super::slug::assign_ids;

/// Name of the engine shipped with the application
pub const DEFAULT_ENGINE: &str = "pulldown-cmark";

/// Errors raised while converting a document
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("{engine} failed: {message}")]
    Engine { engine: String, message: String },
}

/// Errors raised while loading an engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown markdown engine \"{0}\" (available: {DEFAULT_ENGINE})")]
    Unknown(String),
}

/// Fixed configuration handed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Pass embedded HTML through instead of escaping it
    pub raw_html: bool,
    pub tables: bool,
    pub footnotes: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            raw_html: true,
            tables: true,
            footnotes: true,
            strikethrough: true,
            tasklists: true,
        }
    }
}

impl ConvertOptions {
    /// Parser options for pulldown-cmark
    pub fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        if self.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if self.footnotes {
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.tasklists {
            options.insert(Options::ENABLE_TASKLISTS);
        }
        options
    }
}

/// A markdown-to-HTML conversion engine
pub trait MarkdownEngine {
    fn name(&self) -> &str;

    fn to_html(&self, text: &str, options: &ConvertOptions) -> Result<String, ConvertError>;
}

/// Engine backed by pulldown-cmark
#[derive(Debug, Default)]
pub struct PulldownEngine;

impl MarkdownEngine for PulldownEngine {
    fn name(&self) -> &str {
        DEFAULT_ENGINE
    }

    fn to_html(&self, text: &str, options: &ConvertOptions) -> Result<String, ConvertError> {
        // A parser bug must not take the window down with it
        panic::catch_unwind(|| render_pulldown(text, options)).map_err(|payload| {
            ConvertError::Engine {
                engine: DEFAULT_ENGINE.to_string(),
                message: panic_message(payload.as_ref()),
            }
        })
    }
}

fn render_pulldown(text: &str, options: &ConvertOptions) -> String {
    let mut events: Vec<Event> = Parser::new_ext(text, options.parser_options())
        .map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) if !options.raw_html => Event::Text(raw),
            other => other,
        })
        .collect();

    stamp_heading_ids(&mut events);

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "internal error".to_string())
}

/// Plain text of every heading, in document order
pub fn heading_titles(events: &[Event]) -> Vec<String> {
    let mut titles = Vec::new();
    let mut current: Option<String> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { .. }) => current = Some(String::new()),
            Event::End(TagEnd::Heading(_)) => titles.extend(current.take()),
            Event::Text(text) | Event::Code(text) => {
                if let Some(title) = current.as_mut() {
                    title.push_str(text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(title) = current.as_mut() {
                    title.push(' ');
                }
            }
            _ => {}
        }
    }

    titles
}

fn stamp_heading_ids(events: &mut [Event]) {
    let titles = heading_titles(events);
    let mut ids = assign_ids(titles.iter().map(String::as_str)).into_iter();

    for event in events.iter_mut() {
        if let Event::Start(Tag::Heading { id, .. }) = event {
            match ids.next() {
                Some(next) if !next.is_empty() => *id = Some(CowStr::from(next)),
                _ => {}
            }
        }
    }
}

/// Look up an engine by name
pub fn load_engine(name: &str) -> Result<Box<dyn MarkdownEngine>, EngineError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "" | DEFAULT_ENGINE | "pulldown" | "commonmark" => Ok(Box::new(PulldownEngine)),
        _ => Err(EngineError::Unknown(name.to_string())),
    }
}

/// Receives user-visible error reports
pub trait Notify {
    fn error(&mut self, message: String);
}

impl Notify for Vec<String> {
    fn error(&mut self, message: String) {
        self.push(message);
    }
}

/// Converts document text with a loaded engine
pub struct Converter {
    engine: Box<dyn MarkdownEngine>,
    options: ConvertOptions,
}

impl Converter {
    pub fn new(engine: Box<dyn MarkdownEngine>) -> Self {
        Self {
            engine,
            options: ConvertOptions::default(),
        }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Convert `text`, always producing displayable HTML
    pub fn convert(&self, text: &str, notify: &mut dyn Notify) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        match self.engine.to_html(text, &self.options) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("Markdown conversion failed: {}", e);
                let message = format!("Rendering failed: {e}");
                notify.error(message.clone());
                fallback_html(&message)
            }
        }
    }
}

/// Inline fragment shown in place of a document that failed to render
pub fn fallback_html(message: &str) -> String {
    format!(
        "<div class=\"render-error\"><strong>Error</strong><pre>{}</pre></div>\n",
        escape_html(message)
    )
}

/// Escape text for inclusion in HTML
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    struct CountingEngine(Rc<Cell<usize>>);

    impl MarkdownEngine for CountingEngine {
        fn name(&self) -> &str {
            "counting"
        }

        fn to_html(&self, text: &str, _: &ConvertOptions) -> Result<String, ConvertError> {
            self.0.set(self.0.get() + 1);
            Ok(format!("<p>{text}</p>"))
        }
    }

    struct BrokenEngine;

    impl MarkdownEngine for BrokenEngine {
        fn name(&self) -> &str {
            "broken"
        }

        fn to_html(&self, _: &str, _: &ConvertOptions) -> Result<String, ConvertError> {
            Err(ConvertError::Engine {
                engine: "broken".into(),
                message: "unexpected <eof>".into(),
            })
        }
    }

    #[test]
    fn test_empty_input_skips_engine() {
        let calls = Rc::new(Cell::new(0));
        let converter = Converter::new(Box::new(CountingEngine(calls.clone())));
        let mut notes: Vec<String> = Vec::new();

        assert_eq!(converter.convert("", &mut notes), "");
        assert_eq!(converter.convert("  \n\t", &mut notes), "");
        assert_eq!(calls.get(), 0);

        converter.convert("hello", &mut notes);
        assert_eq!(calls.get(), 1);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_failure_yields_fallback_and_notification() {
        let converter = Converter::new(Box::new(BrokenEngine));
        let mut notes: Vec<String> = Vec::new();

        let html = converter.convert("# Title", &mut notes);
        assert!(html.contains("render-error"));
        assert!(html.contains("unexpected &lt;eof&gt;"));
        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("unexpected <eof>"));
    }

    #[test]
    fn test_large_input_converts() {
        let converter = Converter::new(Box::new(PulldownEngine));
        let mut notes: Vec<String> = Vec::new();
        let text = "paragraph of text\n\n".repeat(200_000);

        let html = converter.convert(&text, &mut notes);
        assert!(notes.is_empty());
        assert!(!html.contains("render-error"));
        assert_eq!(html.matches("<p>").count(), 200_000);
    }

    #[test]
    fn test_pulldown_stamps_unique_heading_ids() {
        let html = PulldownEngine
            .to_html("# Intro\n\ntext\n\n## Intro\n\n### `code` span", &ConvertOptions::default())
            .unwrap();
        assert!(html.contains("<h1 id=\"intro\">Intro</h1>"));
        assert!(html.contains("<h2 id=\"intro-1\">Intro</h2>"));
        assert!(html.contains("<h3 id=\"code-span\">"));
    }

    #[test]
    fn test_line_break_in_heading_separates_words() {
        let html = PulldownEngine
            .to_html("Getting\nStarted\n=======\n\nHard  \nBreak\n---\n", &ConvertOptions::default())
            .unwrap();
        assert!(html.contains("<h1 id=\"getting-started\">"));
        assert!(html.contains("<h2 id=\"hard-break\">"));
    }

    #[test]
    fn test_empty_heading_has_no_id() {
        let html = PulldownEngine
            .to_html("#\n\n# !!", &ConvertOptions::default())
            .unwrap();
        assert!(html.contains("<h1></h1>"));
        assert!(html.contains("<h1 id=\"-1\">!!</h1>"));
    }

    #[test]
    fn test_raw_html_passthrough() {
        let text = "<div class=\"note\">hi</div>\n\nsome <kbd>Ctrl</kbd>";
        let html = PulldownEngine
            .to_html(text, &ConvertOptions::default())
            .unwrap();
        assert!(html.contains("<div class=\"note\">hi</div>"));
        assert!(html.contains("<kbd>Ctrl</kbd>"));

        let escaped = PulldownEngine
            .to_html(
                text,
                &ConvertOptions {
                    raw_html: false,
                    ..ConvertOptions::default()
                },
            )
            .unwrap();
        assert!(escaped.contains("&lt;kbd&gt;"));
    }

    #[test]
    fn test_gfm_extensions_enabled() {
        let html = PulldownEngine
            .to_html(
                "| a | b |\n|---|---|\n| 1 | 2 |\n\n~~old~~\n\n- [x] done",
                &ConvertOptions::default(),
            )
            .unwrap();
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>old</del>"));
        assert!(html.contains("checkbox"));
    }

    #[test]
    fn test_load_engine() {
        assert_eq!(load_engine("pulldown-cmark").unwrap().name(), DEFAULT_ENGINE);
        assert_eq!(load_engine(" Pulldown-CMark ").unwrap().name(), DEFAULT_ENGINE);
        let err = load_engine("marked").err().unwrap();
        assert!(err.to_string().contains("\"marked\""));
    }

    #[test]
    fn test_panic_message() {
        let payload = panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"'"), "a&lt;b&gt;&amp;&quot;&#39;");
    }
}
