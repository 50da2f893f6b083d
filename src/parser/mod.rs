//! Document access: the source abstraction and its lopdf implementation.

mod backend;
mod content;
mod pdf_source;
mod structure;

pub use backend::{DocumentSource, MemoryDocument, MemoryPage};
pub use pdf_source::PdfSource;
