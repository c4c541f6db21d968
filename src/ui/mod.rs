//! UI components

pub mod block_renderer;
pub mod editor;
pub mod markdown_blocks;
pub mod preview;
pub mod toast;
pub mod toc;
