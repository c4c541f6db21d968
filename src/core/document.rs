//! The markdown document shown in the previewer

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::samples::EXAMPLE_MARKDOWN;

/// File extensions accepted by the open dialog and drag-and-drop
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "mdown", "mkd", "txt"];

/// Where the document text came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// Read from (and saved to) a file on disk
    File(PathBuf),
    /// Dropped without a path, e.g. from a browser
    Dropped(String),
    /// Built-in example text
    Example,
    /// Empty document after a reset
    Blank,
}

/// A markdown document
#[derive(Debug, Clone)]
pub struct Document {
    pub source: DocumentSource,
    /// Document content
    pub content: String,
    /// Whether the document has unsaved changes
    pub modified: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::blank()
    }
}

impl Document {
    /// Empty document
    pub fn blank() -> Self {
        Self {
            source: DocumentSource::Blank,
            content: String::new(),
            modified: false,
        }
    }

    /// The built-in example document
    pub fn example() -> Self {
        Self {
            source: DocumentSource::Example,
            content: EXAMPLE_MARKDOWN.to_string(),
            modified: false,
        }
    }

    /// Open a document from a file
    pub fn open(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;

        Ok(Self {
            source: DocumentSource::File(path.to_path_buf()),
            content: String::from_utf8_lossy(&bytes).into_owned(),
            modified: false,
        })
    }

    /// Document from dropped bytes that have no backing file
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            source: DocumentSource::Dropped(name.into()),
            content: String::from_utf8_lossy(bytes).into_owned(),
            modified: false,
        }
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            DocumentSource::File(path) => Some(path),
            _ => None,
        }
    }

    /// Save the document to its backing file
    pub fn save(&mut self) -> Result<()> {
        let path = self
            .path()
            .map(Path::to_path_buf)
            .context("Document has no file to save to")?;
        self.save_as(&path)
    }

    /// Save the document to `path` and make it the backing file
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        fs::write(path, &self.content)
            .with_context(|| format!("Failed to save file: {}", path.display()))?;
        tracing::info!("Saved document: {}", path.display());
        self.source = DocumentSource::File(path.to_path_buf());
        self.modified = false;
        Ok(())
    }

    /// Title from front matter, file name or source
    pub fn title(&self) -> String {
        if let Some(title) = Self::frontmatter_title(&self.content) {
            return title;
        }

        match &self.source {
            DocumentSource::File(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "Untitled".to_string()),
            DocumentSource::Dropped(name) => Path::new(name)
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| name.clone()),
            DocumentSource::Example => "Example".to_string(),
            DocumentSource::Blank => "Untitled".to_string(),
        }
    }

    /// Front matter block including its delimiters, if the content starts with one
    fn frontmatter(content: &str) -> Option<(&str, usize)> {
        let rest = content
            .strip_prefix("---\n")
            .or_else(|| content.strip_prefix("---\r\n"))?;
        let header_len = content.len() - rest.len();

        let mut offset = 0;
        for line in rest.split_inclusive('\n') {
            if line.trim_end() == "---" {
                let inner = &rest[..offset];
                return Some((inner, header_len + offset + line.len()));
            }
            offset += line.len();
        }
        None
    }

    fn frontmatter_title(content: &str) -> Option<String> {
        let (inner, _) = Self::frontmatter(content)?;
        inner.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            if key.trim() != "title" {
                return None;
            }
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            (!value.is_empty()).then(|| value.to_string())
        })
    }

    /// Content without front matter, which is what gets rendered
    pub fn body(&self) -> &str {
        match Self::frontmatter(&self.content) {
            Some((_, end)) => self.content[end..].trim_start_matches(['\r', '\n']),
            None => &self.content,
        }
    }

    /// Update content and mark as modified
    pub fn set_content(&mut self, content: String) {
        if self.content != content {
            self.content = content;
            self.modified = true;
        }
    }
}

/// Whether `path` looks like a markdown or plain text file
pub fn is_markdown_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str, content: &[u8]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mdpreview-doc-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_frontmatter_title_and_body() {
        let mut doc = Document::blank();
        doc.set_content("---\ntitle: \"Release Notes\"\ntags: [a]\n---\n\n# Content here\n".into());

        assert_eq!(doc.title(), "Release Notes");
        assert_eq!(doc.body(), "# Content here\n");
        assert!(doc.modified);
    }

    #[test]
    fn test_body_without_frontmatter() {
        let doc = Document::from_bytes("notes.md", b"# Plain\n---\n");
        assert_eq!(doc.body(), "# Plain\n---\n");
        assert_eq!(doc.title(), "notes");
    }

    #[test]
    fn test_unterminated_frontmatter_is_content() {
        let doc = Document::from_bytes("x.md", b"---\ntitle: x\n# Heading");
        assert_eq!(doc.body(), "---\ntitle: x\n# Heading");
        assert_eq!(doc.title(), "x");
    }

    #[test]
    fn test_set_content_unchanged_keeps_clean() {
        let mut doc = Document::example();
        let same = doc.content.clone();
        doc.set_content(same);
        assert!(!doc.modified);
        assert_eq!(doc.title(), "Example");
    }

    #[test]
    fn test_open_invalid_utf8_is_lossy() {
        let path = scratch_file("lossy.md", b"# Caf\xe9\n");
        let doc = Document::open(&path).unwrap();
        assert!(doc.content.starts_with("# Caf"));
        assert!(doc.content.contains('\u{FFFD}'));
        assert_eq!(doc.path(), Some(path.as_path()));
    }

    #[test]
    fn test_save_writes_backing_file() {
        let path = scratch_file("roundtrip.md", b"old");
        let mut doc = Document::open(&path).unwrap();
        doc.set_content("new".into());
        doc.save().unwrap();
        assert!(!doc.modified);
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");

        let copy = path.with_file_name("copy.md");
        doc.save_as(&copy).unwrap();
        assert_eq!(doc.path(), Some(copy.as_path()));
        assert_eq!(doc.title(), "copy");
    }

    #[test]
    fn test_save_without_file_fails() {
        let mut doc = Document::example();
        assert!(doc.save().is_err());
    }

    #[test]
    fn test_open_missing_file() {
        let err = Document::open(Path::new("/definitely/not/here.md")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }

    #[test]
    fn test_markdown_extensions() {
        assert!(is_markdown_path(Path::new("README.md")));
        assert!(is_markdown_path(Path::new("notes.TXT")));
        assert!(!is_markdown_path(Path::new("image.png")));
        assert!(!is_markdown_path(Path::new("Makefile")));
    }
}
