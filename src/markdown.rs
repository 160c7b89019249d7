//! Structural markdown tree
//!
//! The transform only needs the block/inline skeleton of a document, so this
//! module reduces CommonMark to a small owned tree. `parse_document` builds it
//! with `pulldown-cmark`; tests and embedders may also build it by hand.
//!
//! Paragraphs and inline containers also keep the raw source between their
//! delimiters. Expression text must be read from there: rendered text has
//! already lost the `*` operators that markdown took for emphasis.

use pulldown_cmark::{Event, Parser, Tag};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/* ===================== Document Tree ===================== */

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Block {
    Heading { level: u8, content: Vec<Inline> },
    Paragraph {
        content: Vec<Inline>,
        #[serde(default)]
        source: String,
    },
    /// Each item is the inline content of one list entry
    List { ordered: bool, items: Vec<Vec<Inline>> },
    BlockQuote { blocks: Vec<Block> },
    ThematicBreak,
    /// Code blocks, HTML, tables and anything else the language ignores
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Inline {
    Text { v: String },
    Code { v: String },
    Emphasis {
        content: Vec<Inline>,
        #[serde(default)]
        source: String,
    },
    Strong {
        content: Vec<Inline>,
        #[serde(default)]
        source: String,
    },
    Link {
        url: String,
        content: Vec<Inline>,
        #[serde(default)]
        source: String,
    },
    /// Soft or hard line break
    Break,
}

impl Block {
    /// Paragraph whose source is its rendered text
    pub fn paragraph(content: Vec<Inline>) -> Self {
        let source = flatten_text(&content);
        Block::Paragraph { content, source }
    }
}

impl Inline {
    pub fn text(v: impl Into<String>) -> Self {
        Inline::Text { v: v.into() }
    }

    pub fn emphasis(content: Vec<Inline>) -> Self {
        let source = flatten_text(&content);
        Inline::Emphasis { content, source }
    }

    pub fn strong(content: Vec<Inline>) -> Self {
        let source = flatten_text(&content);
        Inline::Strong { content, source }
    }

    pub fn link(url: impl Into<String>, content: Vec<Inline>) -> Self {
        let source = flatten_text(&content);
        Inline::Link {
            url: url.into(),
            content,
            source,
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, Inline::Text { v } if v.trim().is_empty()) || matches!(self, Inline::Break)
    }
}

/// Concatenated text of all inlines
pub fn flatten_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    push_text(inlines, &mut out);
    out
}

fn push_text(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text { v } | Inline::Code { v } => out.push_str(v),
            Inline::Emphasis { content, .. }
            | Inline::Strong { content, .. }
            | Inline::Link { content, .. } => push_text(content, out),
            Inline::Break => out.push(' '),
        }
    }
}

/// Raw source when it was recorded, otherwise the rendered text
pub fn source_or_text(source: &str, content: &[Inline]) -> String {
    if source.is_empty() {
        flatten_text(content)
    } else {
        source.to_string()
    }
}

/// The single non-blank inline of a paragraph, if there is exactly one
pub fn sole_inline(inlines: &[Inline]) -> Option<&Inline> {
    let mut meaningful = inlines.iter().filter(|inline| !inline.is_blank());
    let first = meaningful.next()?;
    match meaningful.next() {
        Some(_) => None,
        None => Some(first),
    }
}

/// Source of the first emphasized span anywhere in the inlines
pub fn find_emphasis(inlines: &[Inline]) -> Option<String> {
    inlines.iter().find_map(|inline| match inline {
        Inline::Emphasis { content, source } => Some(source_or_text(source, content)),
        Inline::Strong { content, .. } | Inline::Link { content, .. } => find_emphasis(content),
        _ => None,
    })
}

/* ===================== pulldown-cmark Adapter ===================== */

/// Container being filled while walking the event stream
enum Open {
    Heading(u8, Vec<Inline>),
    Paragraph(Vec<Inline>),
    List(bool, Vec<Vec<Inline>>),
    Item(Vec<Inline>),
    BlockQuote(Vec<Block>),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Link(String, Vec<Inline>),
    /// Any other container: its content is dropped
    Ignored,
}

/// Parse markdown text into a [`Document`]
pub fn parse_document(text: &str) -> Document {
    let mut root: Vec<Block> = Vec::new();
    let mut stack: Vec<Open> = Vec::new();
    // Byte range covered by the children of each open container
    let mut spans: Vec<Option<Range<usize>>> = Vec::new();

    for (event, range) in Parser::new(text).into_offset_iter() {
        if !matches!(event, Event::End(_)) {
            widen(&mut spans, range);
        }

        match event {
            Event::Start(tag) => {
                stack.push(open_for(tag));
                spans.push(None);
            }
            Event::End(_) => {
                let source = spans
                    .pop()
                    .flatten()
                    .and_then(|span| text.get(span))
                    .map(|raw| raw.trim().to_string())
                    .unwrap_or_default();
                if let Some(open) = stack.pop() {
                    close(open, source, &mut stack, &mut root);
                }
            }
            Event::Text(v) => push_inline(&mut stack, Inline::text(v.into_string())),
            Event::Code(v) => push_inline(&mut stack, Inline::Code { v: v.into_string() }),
            Event::SoftBreak | Event::HardBreak => push_inline(&mut stack, Inline::Break),
            Event::Rule => push_block(&mut stack, &mut root, Block::ThematicBreak),
            Event::Html(_) => push_block(&mut stack, &mut root, Block::Other),
            _ => {}
        }
    }

    Document { blocks: root }
}

fn widen(spans: &mut [Option<Range<usize>>], range: Range<usize>) {
    if let Some(span) = spans.last_mut() {
        *span = Some(match span.take() {
            Some(current) => current.start.min(range.start)..current.end.max(range.end),
            None => range,
        });
    }
}

fn open_for(tag: Tag<'_>) -> Open {
    match tag {
        Tag::Heading { level, .. } => Open::Heading(level as u8, Vec::new()),
        Tag::Paragraph => Open::Paragraph(Vec::new()),
        Tag::List(start) => Open::List(start.is_some(), Vec::new()),
        Tag::Item => Open::Item(Vec::new()),
        Tag::BlockQuote(..) => Open::BlockQuote(Vec::new()),
        Tag::Emphasis => Open::Emphasis(Vec::new()),
        Tag::Strong => Open::Strong(Vec::new()),
        Tag::Link { dest_url, .. } => Open::Link(dest_url.into_string(), Vec::new()),
        _ => Open::Ignored,
    }
}

fn close(open: Open, source: String, stack: &mut Vec<Open>, root: &mut Vec<Block>) {
    match open {
        Open::Heading(level, content) => push_block(stack, root, Block::Heading { level, content }),
        Open::Paragraph(content) => push_paragraph(stack, root, content, source),
        Open::List(ordered, items) => push_block(stack, root, Block::List { ordered, items }),
        Open::Item(content) => {
            if let Some(Open::List(_, items)) = stack.last_mut() {
                items.push(content);
            }
        }
        Open::BlockQuote(blocks) => push_block(stack, root, Block::BlockQuote { blocks }),
        Open::Emphasis(content) => push_inline(stack, Inline::Emphasis { content, source }),
        Open::Strong(content) => push_inline(stack, Inline::Strong { content, source }),
        Open::Link(url, content) => push_inline(
            stack,
            Inline::Link {
                url,
                content,
                source,
            },
        ),
        Open::Ignored => {
            if !stack.iter().any(|o| matches!(o, Open::Ignored)) {
                push_block(stack, root, Block::Other);
            }
        }
    }
}

fn push_inline(stack: &mut [Open], inline: Inline) {
    match stack.last_mut() {
        Some(Open::Heading(_, content))
        | Some(Open::Paragraph(content))
        | Some(Open::Item(content))
        | Some(Open::Emphasis(content))
        | Some(Open::Strong(content))
        | Some(Open::Link(_, content)) => match (content.last_mut(), inline) {
            // the parser may split one run of text into several events
            (Some(Inline::Text { v: last }), Inline::Text { v }) => last.push_str(&v),
            (_, inline) => content.push(inline),
        },
        _ => {}
    }
}

/// Paragraphs inside loose list items contribute their inlines to the item
fn push_paragraph(stack: &mut [Open], root: &mut Vec<Block>, content: Vec<Inline>, source: String) {
    if let Some(Open::Item(item)) = stack.last_mut() {
        if !item.is_empty() {
            item.push(Inline::Break);
        }
        item.extend(content);
        return;
    }
    push_block(stack, root, Block::Paragraph { content, source });
}

fn push_block(stack: &mut [Open], root: &mut Vec<Block>, block: Block) {
    match stack.last_mut() {
        None => root.push(block),
        Some(Open::BlockQuote(blocks)) => blocks.push(block),
        // nested lists and other blocks inside list items are not part of the language
        Some(_) => {}
    }
}
