//! Data model for layout analysis.
//!
//! Raw fragments from a document source are normalized into [`TextItem`]s,
//! grouped into [`Line`]s and [`Paragraph`]s, and finally classified into
//! [`Block`]s. Tagged documents bypass that chain with a [`TaggedPage`].

mod fragment;
mod line;
mod paragraph;
mod structure;

pub use fragment::{RawFragment, TextItem};
pub use line::{dominant_font_size, Line};
pub(crate) use line::{is_spaceless_script_char, size_key};
pub use paragraph::{Block, Emphasis, Paragraph};
pub use structure::{StructChild, StructNode, StructRole, TaggedPage};
