//! Built-in example document

/// Text loaded by "Load Example"
pub const EXAMPLE_MARKDOWN: &str = r#"# Markdown Preview

Open a file with **Ctrl+O**, drop one onto the window, or edit this text in
the editor pane. The outline on the left follows your position while you
scroll.

## Text

Paragraphs support *emphasis*, **strong text**, ~~strikethrough~~ and
`inline code`. Links look like [this one](https://commonmark.org).

> Quotes are rendered with a bar on the left.

## Lists

- Unordered items
- With a second entry
  - And nesting

1. Ordered items
2. Keep their numbers

- [x] Task lists
- [ ] Track progress

## Code

```rust
fn main() {
    println!("Hello from a fenced block");
}
```

## Tables

| Shortcut     | Action            |
|--------------|-------------------|
| Ctrl+O       | Open file         |
| Ctrl+P       | Print             |
| Ctrl+T       | Toggle theme      |
| F5           | Refresh preview   |
| F11          | Fullscreen        |

## Raw HTML

Embedded markup such as <kbd>Ctrl</kbd> is passed through to the exported
HTML.

## Text

Headings with the same text get distinct anchors, so this section links to
`#text-1`.

---

Happy writing.
"#;
