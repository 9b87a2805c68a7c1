//! Rendering collaborator interface

use crate::error::RenderError;

/// Output of a rendering collaborator; both payloads are opaque bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub pdf: Vec<u8>,
    pub preview: Vec<u8>,
}

/// Turns final document markup into a PDF and a preview image
///
/// Implemented outside this crate (headless browser, print service).
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, html: &str) -> Result<RenderedDocument, RenderError>;
}
