//! Semantic structure trees for tagged documents.

use std::fmt;

use serde::{Serialize, Serializer};

/// Structure role of a tagged node.
///
/// Standard tags map to dedicated variants; anything unrecognized keeps its
/// original name in [`StructRole::Unknown`] and renders as plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructRole {
    /// `H` (level 1) or `H1`..`H6`
    Heading(u8),
    /// `P`, `SPAN`
    Paragraph,
    /// `L`
    List,
    /// `LI`, `LBODY`
    ListItem,
    /// `TABLE`
    Table,
    /// `FIGURE`, `CAPTION`
    Figure,
    /// `BLOCKQUOTE`
    BlockQuote,
    /// `CODE`
    Code,
    /// `LINK`, `ANNOT`
    Link,
    /// Grouping elements with no markup of their own
    Container,
    /// Any other tag
    Unknown(String),
}

impl StructRole {
    /// Classify a tag name (case-insensitive).
    pub fn from_tag(tag: &str) -> Self {
        let upper = tag.trim().to_ascii_uppercase();
        match upper.as_str() {
            "H" | "H1" => StructRole::Heading(1),
            "H2" => StructRole::Heading(2),
            "H3" => StructRole::Heading(3),
            "H4" => StructRole::Heading(4),
            "H5" => StructRole::Heading(5),
            "H6" => StructRole::Heading(6),
            "P" | "SPAN" => StructRole::Paragraph,
            "L" => StructRole::List,
            "LI" | "LBODY" => StructRole::ListItem,
            "TABLE" => StructRole::Table,
            "FIGURE" | "CAPTION" => StructRole::Figure,
            "BLOCKQUOTE" => StructRole::BlockQuote,
            "CODE" => StructRole::Code,
            "LINK" | "ANNOT" => StructRole::Link,
            "ROOT" | "DOCUMENT" | "PART" | "SECT" | "DIV" | "ART" | "NONSTRUCT" | "PRIVATE" => {
                StructRole::Container
            }
            _ => StructRole::Unknown(tag.to_string()),
        }
    }

    /// Whether the role is one of the standard tags.
    pub fn is_known(&self) -> bool {
        !matches!(self, StructRole::Unknown(_))
    }
}

impl fmt::Display for StructRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructRole::Heading(level) => write!(f, "H{}", level),
            StructRole::Paragraph => write!(f, "P"),
            StructRole::List => write!(f, "L"),
            StructRole::ListItem => write!(f, "LI"),
            StructRole::Table => write!(f, "Table"),
            StructRole::Figure => write!(f, "Figure"),
            StructRole::BlockQuote => write!(f, "BlockQuote"),
            StructRole::Code => write!(f, "Code"),
            StructRole::Link => write!(f, "Link"),
            StructRole::Container => write!(f, "Div"),
            StructRole::Unknown(tag) => write!(f, "{}", tag),
        }
    }
}

impl Serialize for StructRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A child of a structure node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StructChild {
    /// A nested structure element
    Node(StructNode),
    /// Marked content: consumes the next item of the page's item stream
    Leaf,
}

/// A structure element with ordered children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructNode {
    /// Semantic role
    pub role: StructRole,
    /// Ordered children
    pub children: Vec<StructChild>,
}

impl StructNode {
    /// Create a node with no children.
    pub fn new(role: StructRole) -> Self {
        Self {
            role,
            children: Vec::new(),
        }
    }

    /// Create a node from a tag name.
    pub fn tagged(tag: &str) -> Self {
        Self::new(StructRole::from_tag(tag))
    }

    /// Append a nested node.
    pub fn with_child(mut self, child: StructNode) -> Self {
        self.children.push(StructChild::Node(child));
        self
    }

    /// Append a leaf marker.
    pub fn with_leaf(mut self) -> Self {
        self.children.push(StructChild::Leaf);
        self
    }

    /// Append `count` leaf markers.
    pub fn with_leaves(mut self, count: usize) -> Self {
        self.children
            .extend(std::iter::repeat_with(|| StructChild::Leaf).take(count));
        self
    }

    /// Total number of leaf markers in this subtree.
    pub fn leaf_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| match c {
                StructChild::Node(n) => n.leaf_count(),
                StructChild::Leaf => 1,
            })
            .sum()
    }

    /// Check if the subtree has no leaves.
    pub fn is_empty(&self) -> bool {
        self.leaf_count() == 0
    }
}

/// The structure tree of one page together with its item stream.
///
/// `items` holds the raw text of each marked-content leaf in tree-traversal
/// order, so the walker consumes them front to back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedPage {
    /// Root of the page's structure tree
    pub root: StructNode,
    /// Raw item strings in tree-traversal order
    pub items: Vec<String>,
}

impl TaggedPage {
    /// Create a tagged page.
    pub fn new(root: StructNode, items: Vec<String>) -> Self {
        Self { root, items }
    }
}
