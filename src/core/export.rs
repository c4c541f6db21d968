//! Standalone HTML pages for printing and export

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::config::Theme;
use super::convert::escape_html;

const BASE_CSS: &str = r#"
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif;
       line-height: 1.6; max-width: 860px; margin: 2rem auto; padding: 0 1.5rem; }
pre, code { font-family: "SFMono-Regular", Consolas, "Liberation Mono", monospace; }
pre { padding: 0.8rem 1rem; overflow-x: auto; border-radius: 4px; }
table { border-collapse: collapse; }
th, td { border: 1px solid #8884; padding: 0.3rem 0.7rem; }
blockquote { margin-left: 0; padding-left: 1rem; border-left: 4px solid #8888; }
.render-error { border: 1px solid #d33; color: #d33; padding: 0.5rem 1rem; }
@media print { body { max-width: none; margin: 0; } a { color: inherit; } }
"#;

const LIGHT_CSS: &str = r#"
body { background: #ffffff; color: #24292f; }
pre, code { background: #f3f4f6; }
a { color: #0969da; }
"#;

const DARK_CSS: &str = r#"
body { background: #1b1b1f; color: #e0e0e0; }
pre, code { background: #2a2a30; }
a { color: #8bb4e9; }
"#;

/// Build a complete HTML page around a rendered body
pub fn standalone_html(title: &str, body_html: &str, theme: Theme, auto_print: bool) -> String {
    let theme_css = match theme {
        Theme::Light => LIGHT_CSS,
        Theme::Dark => DARK_CSS,
    };
    let script = if auto_print {
        "<script>window.addEventListener(\"load\", () => window.print());</script>\n"
    } else {
        ""
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
         <style>{BASE_CSS}{theme_css}</style>\n{script}</head>\n<body>\n{body_html}</body>\n</html>\n",
        escape_html(title),
    )
}

/// Write a standalone page to `path`
pub fn write_html(path: &Path, title: &str, body_html: &str, theme: Theme) -> Result<()> {
    let page = standalone_html(title, body_html, theme, false);
    fs::write(path, page).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Exported HTML to: {}", path.display());
    Ok(())
}

/// Hand the document to the system browser, which opens its print dialog
///
/// Printed pages always use the light palette.
pub fn print(title: &str, body_html: &str) -> Result<PathBuf> {
    let page = standalone_html(title, body_html, Theme::Light, true);
    let path = std::env::temp_dir().join(print_file_name(title));

    fs::write(&path, page).with_context(|| format!("Failed to write {}", path.display()))?;
    open::that(&path).with_context(|| format!("Failed to open {}", path.display()))?;

    tracing::info!("Sent {} to the system browser for printing", path.display());
    Ok(path)
}

fn print_file_name(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "document".to_string() } else { stem };
    format!("mdpreview-print-{stem}.html")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_wraps_body_and_escapes_title() {
        let page = standalone_html("A <b> & C", "<h1 id=\"a\">A</h1>\n", Theme::Dark, false);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>A &lt;b&gt; &amp; C</title>"));
        assert!(page.contains("<h1 id=\"a\">A</h1>"));
        assert!(page.contains("#1b1b1f"));
        assert!(!page.contains("window.print"));
    }

    #[test]
    fn test_print_page_has_script() {
        let page = standalone_html("Doc", "", Theme::Light, true);
        assert!(page.contains("window.print()"));
        assert!(page.contains("#ffffff"));
    }

    #[test]
    fn test_write_html() {
        let path = std::env::temp_dir().join(format!("mdpreview-export-{}.html", std::process::id()));
        write_html(&path, "Doc", "<p>hi</p>", Theme::Light).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("<p>hi</p>"));
    }

    #[test]
    fn test_print_file_name_is_safe() {
        assert_eq!(print_file_name("a/b c"), "mdpreview-print-a_b_c.html");
        assert_eq!(print_file_name(""), "mdpreview-print-document.html");
    }
}
