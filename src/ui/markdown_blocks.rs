//! Markdown block parsing for the preview
//!
//! This module turns markdown into a tree of displayable blocks. Headings
//! carry the same identifiers the HTML output uses, so the table of contents,
//! the scroll-spy and exported anchors all agree.

use pulldown_cmark::{Alignment, CodeBlockKind, Event, Parser, Tag, TagEnd};

use crate::core::convert::ConvertOptions;
use crate::core::slug::IdAssigner;

/// Character styling of an inline span
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub strong: bool,
    pub emphasis: bool,
    pub strikethrough: bool,
    pub code: bool,
}

/// A run of inline text with uniform styling
#[derive(Debug, Clone, PartialEq)]
pub struct InlineSpan {
    pub text: String,
    pub style: SpanStyle,
    /// Link target when the span is part of a link
    pub link: Option<String>,
}

/// A list item
#[derive(Debug, Clone, Default)]
pub struct ListItem {
    pub spans: Vec<InlineSpan>,
    /// Checkbox state: Some(true) = checked, Some(false) = unchecked, None = no checkbox
    pub checkbox: Option<bool>,
    /// Nested blocks (sublists, code blocks, quotes)
    pub children: Vec<ParsedBlock>,
}

/// Table column alignment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl From<Alignment> for TableAlignment {
    fn from(alignment: Alignment) -> Self {
        match alignment {
            Alignment::Center => TableAlignment::Center,
            Alignment::Right => TableAlignment::Right,
            Alignment::None | Alignment::Left => TableAlignment::Left,
        }
    }
}

/// A parsed markdown block
#[derive(Debug, Clone)]
pub enum ParsedBlock {
    /// Heading with level (1-6), plain text and anchor identifier
    Heading { level: u8, text: String, id: String },

    Paragraph { spans: Vec<InlineSpan> },

    /// Fenced or indented code block
    CodeBlock { lang: Option<String>, code: String },

    /// Unordered or ordered list
    List {
        items: Vec<ListItem>,
        start: Option<u64>,
    },

    BlockQuote { content: Vec<ParsedBlock> },

    HorizontalRule,

    Table {
        alignments: Vec<TableAlignment>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },

    Image {
        alt: String,
        url: String,
        title: Option<String>,
    },

    /// Raw HTML block, shown as source
    Html { html: String },
}

/// A heading as listed in the table of contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub level: u8,
    pub text: String,
    pub id: String,
}

/// Parse markdown content into blocks
pub fn parse_blocks(content: &str) -> Vec<ParsedBlock> {
    let options = ConvertOptions::default().parser_options();
    let mut events = Parser::new_ext(content, options);

    let mut blocks = parse_container(&mut events);

    let mut assigner = IdAssigner::new();
    visit_headings_mut(&mut blocks, &mut |text: &str, id: &mut String| {
        *id = assigner.assign(text)
    });

    blocks
}

/// Headings in document order
pub fn outline(blocks: &[ParsedBlock]) -> Vec<OutlineEntry> {
    let mut entries = Vec::new();
    collect_outline(blocks, &mut entries);
    entries
}

fn collect_outline(blocks: &[ParsedBlock], entries: &mut Vec<OutlineEntry>) {
    for block in blocks {
        match block {
            ParsedBlock::Heading { level, text, id } => entries.push(OutlineEntry {
                level: *level,
                text: text.clone(),
                id: id.clone(),
            }),
            ParsedBlock::BlockQuote { content } => collect_outline(content, entries),
            ParsedBlock::List { items, .. } => {
                for item in items {
                    collect_outline(&item.children, entries);
                }
            }
            _ => {}
        }
    }
}

fn visit_headings_mut(blocks: &mut [ParsedBlock], f: &mut dyn FnMut(&str, &mut String)) {
    for block in blocks {
        match block {
            ParsedBlock::Heading { text, id, .. } => f(text, id),
            ParsedBlock::BlockQuote { content } => visit_headings_mut(content, f),
            ParsedBlock::List { items, .. } => {
                for item in items {
                    visit_headings_mut(&mut item.children, f);
                }
            }
            _ => {}
        }
    }
}

/// Parse blocks until the end tag of the enclosing container
fn parse_container<'a>(events: &mut impl Iterator<Item = Event<'a>>) -> Vec<ParsedBlock> {
    let mut blocks = Vec::new();

    while let Some(event) = events.next() {
        match event {
            Event::Start(tag) => parse_block(tag, events, &mut blocks),
            Event::End(_) => break,
            Event::Rule => blocks.push(ParsedBlock::HorizontalRule),
            Event::Html(html) => blocks.push(ParsedBlock::Html {
                html: html.to_string(),
            }),
            Event::Text(text) => blocks.push(ParsedBlock::Paragraph {
                spans: vec![InlineSpan {
                    text: text.to_string(),
                    style: SpanStyle::default(),
                    link: None,
                }],
            }),
            _ => {}
        }
    }

    blocks
}

/// Parse the block opened by `tag`, consuming events up to its end tag
fn parse_block<'a>(
    tag: Tag<'a>,
    events: &mut impl Iterator<Item = Event<'a>>,
    blocks: &mut Vec<ParsedBlock>,
) {
    match tag {
        Tag::Heading { level, .. } => {
            let inline = collect_inline(events);
            blocks.push(ParsedBlock::Heading {
                level: level as u8,
                text: inline.plain,
                id: String::new(),
            });
        }
        Tag::Paragraph => {
            let inline = collect_inline(events);
            inline.into_blocks(blocks);
        }
        Tag::CodeBlock(kind) => {
            let lang = match kind {
                CodeBlockKind::Fenced(info) => info
                    .split_whitespace()
                    .next()
                    .filter(|lang| !lang.is_empty())
                    .map(str::to_string),
                CodeBlockKind::Indented => None,
            };
            let mut code = String::new();
            for event in events.by_ref() {
                match event {
                    Event::Text(text) => code.push_str(&text),
                    Event::End(_) => break,
                    _ => {}
                }
            }
            blocks.push(ParsedBlock::CodeBlock { lang, code });
        }
        Tag::HtmlBlock => {
            let mut html = String::new();
            for event in events.by_ref() {
                match event {
                    Event::Html(raw) | Event::Text(raw) => html.push_str(&raw),
                    Event::End(_) => break,
                    _ => {}
                }
            }
            blocks.push(ParsedBlock::Html { html });
        }
        Tag::List(start) => {
            let mut items = Vec::new();
            while let Some(event) = events.next() {
                match event {
                    Event::Start(Tag::Item) => items.push(parse_item(events)),
                    Event::End(_) => break,
                    _ => {}
                }
            }
            blocks.push(ParsedBlock::List { items, start });
        }
        Tag::BlockQuote(_) => {
            let content = parse_container(events);
            blocks.push(ParsedBlock::BlockQuote { content });
        }
        Tag::Table(alignments) => blocks.push(parse_table(alignments, events)),
        // Footnote definitions, metadata and other containers are flattened
        _ => blocks.extend(parse_container(events)),
    }
}

fn parse_item<'a>(events: &mut impl Iterator<Item = Event<'a>>) -> ListItem {
    let mut item = ListItem::default();
    let mut inline = InlineBuilder::default();

    while let Some(event) = events.next() {
        let Some(event) = inline.push(event) else {
            continue;
        };
        match event {
            Event::TaskListMarker(checked) => item.checkbox = Some(checked),
            Event::End(_) => break,
            Event::Start(Tag::Paragraph) => {
                if !inline.spans.is_empty() {
                    inline.text("\n");
                }
                let paragraph = collect_inline(events);
                inline.spans.extend(paragraph.spans);
                inline.images.extend(paragraph.images);
            }
            Event::Start(tag) => parse_block(tag, events, &mut item.children),
            _ => {}
        }
    }

    item.spans = inline.spans;
    for image in inline.images {
        item.children.push(image.into_block());
    }
    item
}

fn parse_table<'a>(
    alignments: Vec<Alignment>,
    events: &mut impl Iterator<Item = Event<'a>>,
) -> ParsedBlock {
    let mut headers = Vec::new();
    let mut rows = Vec::new();
    let mut current_row: Vec<String> = Vec::new();

    while let Some(event) = events.next() {
        match event {
            Event::Start(Tag::TableCell) => current_row.push(collect_inline(events).display_text()),
            Event::End(TagEnd::TableHead) => headers = std::mem::take(&mut current_row),
            Event::End(TagEnd::TableRow) => rows.push(std::mem::take(&mut current_row)),
            Event::End(TagEnd::Table) => break,
            _ => {}
        }
    }

    ParsedBlock::Table {
        alignments: alignments.into_iter().map(TableAlignment::from).collect(),
        headers,
        rows,
    }
}

/// Collect inline content up to the end tag of the enclosing block
fn collect_inline<'a>(events: &mut impl Iterator<Item = Event<'a>>) -> InlineBuilder {
    let mut inline = InlineBuilder::default();
    for event in events.by_ref() {
        if let Some(Event::End(_)) = inline.push(event) {
            break;
        }
    }
    inline
}

#[derive(Debug)]
struct PendingImage {
    url: String,
    title: String,
    alt: String,
}

impl PendingImage {
    fn new(url: String, title: String) -> Self {
        Self {
            url,
            title,
            alt: String::new(),
        }
    }

    fn into_block(self) -> ParsedBlock {
        ParsedBlock::Image {
            alt: self.alt,
            url: self.url,
            title: (!self.title.is_empty()).then_some(self.title),
        }
    }
}

/// Accumulates inline events into styled spans
#[derive(Debug, Default)]
struct InlineBuilder {
    spans: Vec<InlineSpan>,
    /// Text, code and line breaks only, used for heading identifiers
    plain: String,
    images: Vec<PendingImage>,
    image: Option<PendingImage>,
    style: SpanStyle,
    strong_depth: usize,
    emphasis_depth: usize,
    strike_depth: usize,
    links: Vec<String>,
}

impl InlineBuilder {
    /// Consume an inline event, handing back events that are not inline
    fn push<'a>(&mut self, event: Event<'a>) -> Option<Event<'a>> {
        if let Some(image) = self.image.as_mut() {
            match event {
                Event::Text(text) | Event::Code(text) => {
                    image.alt.push_str(&text);
                    self.plain.push_str(&text);
                }
                Event::SoftBreak | Event::HardBreak => {
                    image.alt.push(' ');
                    self.plain.push(' ');
                }
                Event::End(TagEnd::Image) => {
                    if let Some(done) = self.image.take() {
                        self.images.push(done);
                    }
                }
                _ => {}
            }
            return None;
        }

        match event {
            Event::Text(text) => {
                self.plain.push_str(&text);
                self.text(&text);
            }
            Event::Code(code) => {
                self.plain.push_str(&code);
                let style = SpanStyle {
                    code: true,
                    ..self.style
                };
                self.push_span(&code, style);
            }
            Event::InlineHtml(html) => {
                let style = SpanStyle {
                    code: true,
                    ..SpanStyle::default()
                };
                self.push_span(&html, style);
            }
            Event::FootnoteReference(label) => self.text(&format!("[{label}]")),
            Event::SoftBreak => {
                self.plain.push(' ');
                self.text(" ");
            }
            Event::HardBreak => {
                self.plain.push(' ');
                self.text("\n");
            }
            Event::Start(Tag::Strong) => self.strong_depth += 1,
            Event::Start(Tag::Emphasis) => self.emphasis_depth += 1,
            Event::Start(Tag::Strikethrough) => self.strike_depth += 1,
            Event::Start(Tag::Link { dest_url, .. }) => self.links.push(dest_url.to_string()),
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) => {
                self.image = Some(PendingImage::new(dest_url.to_string(), title.to_string()));
            }
            Event::End(TagEnd::Strong) => self.strong_depth = self.strong_depth.saturating_sub(1),
            Event::End(TagEnd::Emphasis) => {
                self.emphasis_depth = self.emphasis_depth.saturating_sub(1)
            }
            Event::End(TagEnd::Strikethrough) => {
                self.strike_depth = self.strike_depth.saturating_sub(1)
            }
            Event::End(TagEnd::Link) => {
                self.links.pop();
            }
            other => return Some(other),
        }

        self.style = SpanStyle {
            strong: self.strong_depth > 0,
            emphasis: self.emphasis_depth > 0,
            strikethrough: self.strike_depth > 0,
            code: false,
        };
        None
    }

    fn text(&mut self, text: &str) {
        self.push_span(text, self.style);
    }

    fn push_span(&mut self, text: &str, style: SpanStyle) {
        let link = self.links.last().cloned();
        if let Some(last) = self.spans.last_mut() {
            if last.style == style && last.link == link && !style.code {
                last.text.push_str(text);
                return;
            }
        }
        self.spans.push(InlineSpan {
            text: text.to_string(),
            style,
            link,
        });
    }

    fn display_text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    /// Paragraph followed by the images it contained
    fn into_blocks(self, blocks: &mut Vec<ParsedBlock>) {
        if !self.display_text().trim().is_empty() {
            blocks.push(ParsedBlock::Paragraph { spans: self.spans });
        }
        blocks.extend(self.images.into_iter().map(PendingImage::into_block));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::convert::{MarkdownEngine, PulldownEngine};

    fn headings(content: &str) -> Vec<(u8, String, String)> {
        outline(&parse_blocks(content))
            .into_iter()
            .map(|e| (e.level, e.text, e.id))
            .collect()
    }

    #[test]
    fn test_heading_ids_unique() {
        let found = headings("# Intro\n\ntext\n\n## Intro\n\n### Details `x`");
        assert_eq!(
            found,
            vec![
                (1, "Intro".to_string(), "intro".to_string()),
                (2, "Intro".to_string(), "intro-1".to_string()),
                (3, "Details x".to_string(), "details-x".to_string()),
            ]
        );
    }

    #[test]
    fn test_nested_headings_follow_document_order() {
        let found = headings("> # Quoted\n\n- item\n\n  # In list\n\n# Quoted");
        let ids: Vec<_> = found.iter().map(|(_, _, id)| id.as_str()).collect();
        assert_eq!(ids, ["quoted", "in-list", "quoted-1"]);
    }

    #[test]
    fn test_outline_matches_html_anchors() {
        let text = "# A <b>bold</b> move\n\n## Setup\n\n## Setup\n\n> ## Setup\n\n# Überblick\n\nGetting\nStarted\n=======\n";
        let html = PulldownEngine
            .to_html(text, &ConvertOptions::default())
            .unwrap();

        for entry in outline(&parse_blocks(text)) {
            assert!(
                html.contains(&format!("id=\"{}\"", entry.id)),
                "missing anchor {}",
                entry.id
            );
        }
        assert!(html.contains("id=\"getting-started\""));
    }

    #[test]
    fn test_paragraph_spans_keep_styles() {
        let blocks = parse_blocks("plain **bold *both*** `code` [link](https://x.org)");
        let ParsedBlock::Paragraph { spans } = &blocks[0] else {
            panic!("expected paragraph, got {:?}", blocks[0]);
        };

        assert_eq!(spans[0].text, "plain ");
        assert!(spans[1].style.strong && !spans[1].style.emphasis);
        assert!(spans[2].style.strong && spans[2].style.emphasis);
        assert!(spans.iter().any(|s| s.style.code && s.text == "code"));
        let link = spans.iter().find(|s| s.link.is_some()).unwrap();
        assert_eq!(link.text, "link");
        assert_eq!(link.link.as_deref(), Some("https://x.org"));
    }

    #[test]
    fn test_task_list_and_nesting() {
        let blocks = parse_blocks("- [x] done\n- [ ] todo\n  1. first\n  2. second\n");
        let ParsedBlock::List { items, start } = &blocks[0] else {
            panic!("expected list");
        };
        assert_eq!(*start, None);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].checkbox, Some(true));
        assert_eq!(items[1].checkbox, Some(false));
        assert_eq!(items[1].spans[0].text, "todo");
        assert!(matches!(
            items[1].children[0],
            ParsedBlock::List { start: Some(1), .. }
        ));
    }

    #[test]
    fn test_code_table_and_rule() {
        let blocks = parse_blocks(
            "```rust ignore\nfn x() {}\n```\n\n| a | b |\n|:-:|--:|\n| 1 | 2 |\n\n---\n",
        );
        assert!(matches!(
            &blocks[0],
            ParsedBlock::CodeBlock { lang: Some(lang), code } if lang == "rust" && code == "fn x() {}\n"
        ));
        let ParsedBlock::Table {
            alignments,
            headers,
            rows,
        } = &blocks[1]
        else {
            panic!("expected table");
        };
        assert_eq!(alignments, &[TableAlignment::Center, TableAlignment::Right]);
        assert_eq!(headers, &["a", "b"]);
        assert_eq!(rows, &[vec!["1".to_string(), "2".to_string()]]);
        assert!(matches!(blocks[2], ParsedBlock::HorizontalRule));
    }

    #[test]
    fn test_standalone_image_becomes_block() {
        let blocks = parse_blocks("![A cat](cat.png \"Cat\")");
        assert_eq!(blocks.len(), 1);
        assert!(matches!(
            &blocks[0],
            ParsedBlock::Image { alt, url, title: Some(title) }
                if alt == "A cat" && url == "cat.png" && title == "Cat"
        ));
    }

    #[test]
    fn test_html_block_kept_as_source() {
        let blocks = parse_blocks("<div>\nraw\n</div>\n\nafter");
        assert!(matches!(&blocks[0], ParsedBlock::Html { html } if html.contains("<div>")));
        assert!(matches!(&blocks[1], ParsedBlock::Paragraph { .. }));
    }

    #[test]
    fn test_blockquote_content() {
        let blocks = parse_blocks("> first\n>\n> second");
        let ParsedBlock::BlockQuote { content } = &blocks[0] else {
            panic!("expected quote");
        };
        assert_eq!(content.len(), 2);
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_blocks("").is_empty());
        assert!(outline(&parse_blocks("just text")).is_empty());
    }
}
