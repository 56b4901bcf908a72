//! Document Flattener — reduces the editor's block tree to plain text plus media URLs.
//!
//! The stored `content` column is loosely typed JSON. It is parsed into a total
//! `Block` tree first (unknown or malformed nodes become `BlockKind::Unknown`), so that
//! text extraction and the media walk never fail.

use serde_json::Value;

// ────────────────────────────────────────────────────────────────────────────
// Block tree
// ────────────────────────────────────────────────────────────────────────────

/// Metadata carried by media blocks in their `props` object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaProps {
    pub url: Option<String>,
    pub name: Option<String>,
    pub alt: Option<String>,
    pub mime: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Paragraph,
    Heading,
    BulletListItem,
    NumberedListItem,
    CheckListItem,
    Quote,
    CodeBlock,
    Table,
    Image(MediaProps),
    Video(MediaProps),
    Audio(MediaProps),
    File(MediaProps),
    /// Any `type` this service does not model, or a node with no `type` at all.
    Unknown(String),
}

/// An inline span. Spans without a `text` field (links, mentions) contribute nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineSpan {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub content: Vec<InlineSpan>,
    pub children: Vec<Block>,
}

impl Block {
    /// Parses one node. Never fails: anything that is not an object is an empty unknown block.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Block {
                kind: BlockKind::Unknown(String::new()),
                content: Vec::new(),
                children: Vec::new(),
            };
        };

        let block_type = obj.get("type").and_then(Value::as_str).unwrap_or("");
        let props = obj.get("props");

        let kind = match block_type {
            "paragraph" => BlockKind::Paragraph,
            "heading" => BlockKind::Heading,
            "bulletListItem" => BlockKind::BulletListItem,
            "numberedListItem" => BlockKind::NumberedListItem,
            "checkListItem" => BlockKind::CheckListItem,
            "quote" => BlockKind::Quote,
            "codeBlock" => BlockKind::CodeBlock,
            "table" => BlockKind::Table,
            "image" => BlockKind::Image(media_props(props)),
            "video" => BlockKind::Video(media_props(props)),
            "audio" => BlockKind::Audio(media_props(props)),
            "file" => BlockKind::File(media_props(props)),
            other => BlockKind::Unknown(other.to_string()),
        };

        // Table content is an object, not a span list; it yields no spans.
        let content = obj
            .get("content")
            .and_then(Value::as_array)
            .map(|spans| {
                spans
                    .iter()
                    .map(|span| InlineSpan {
                        text: span
                            .get("text")
                            .and_then(Value::as_str)
                            .unwrap_or("")
                            .to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let children = obj
            .get("children")
            .and_then(Value::as_array)
            .map(|nodes| nodes.iter().map(Block::from_value).collect())
            .unwrap_or_default();

        Block {
            kind,
            content,
            children,
        }
    }

    /// Concatenation of this block's own spans. Children are not included.
    pub fn own_text(&self) -> String {
        self.content.iter().map(|s| s.text.as_str()).collect()
    }

    /// URL of an image block with a non-empty `props.url`.
    pub fn image_url(&self) -> Option<&str> {
        match &self.kind {
            BlockKind::Image(props) => props.url.as_deref().filter(|u| !u.is_empty()),
            _ => None,
        }
    }
}

fn media_props(props: Option<&Value>) -> MediaProps {
    let field = |key: &str| {
        props
            .and_then(|p| p.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    MediaProps {
        url: field("url"),
        name: field("name"),
        alt: field("alt"),
        mime: field("mime").or_else(|| field("type")),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Flattening
// ────────────────────────────────────────────────────────────────────────────

/// A whole document. A non-array `content` column parses to an empty document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn from_value(value: &Value) -> Self {
        let blocks = value
            .as_array()
            .map(|nodes| nodes.iter().map(Block::from_value).collect())
            .unwrap_or_default();
        Document { blocks }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flattened {
    pub plain_text: String,
    pub image_urls: Vec<String>,
}

/// Flattens a raw `content` value. See [`flatten_document`].
pub fn flatten(content: &Value) -> Flattened {
    flatten_document(&Document::from_value(content))
}

/// Plain text: one line per top-level block with non-blank own text, trimmed, joined by `\n`.
/// Image URLs: pre-order over every block and all of its descendants.
pub fn flatten_document(doc: &Document) -> Flattened {
    let plain_text = doc
        .blocks
        .iter()
        .map(|b| b.own_text().trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let mut image_urls = Vec::new();
    for block in &doc.blocks {
        collect_image_urls(block, &mut image_urls);
    }

    Flattened {
        plain_text,
        image_urls,
    }
}

fn collect_image_urls(block: &Block, out: &mut Vec<String>) {
    if let Some(url) = block.image_url() {
        out.push(url.to_string());
    }
    for child in &block.children {
        collect_image_urls(child, out);
    }
}
