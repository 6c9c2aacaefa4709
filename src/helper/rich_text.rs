//! Renders a post body (Portable Text blocks) to HTML.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::content::ImageUrlBuilder;
use crate::models::portable_text::{MarkDef, Span, TextBlock};
use crate::models::{Block, ImageRef};

const BODY_IMAGE_WIDTH: u32 = 800;
const BODY_IMAGE_HEIGHT: u32 = 600;
/// Deeper `level`s are flattened to this nesting.
const MAX_LIST_DEPTH: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bullet,
    Number,
}

impl ListKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "bullet" => Some(ListKind::Bullet),
            "number" => Some(ListKind::Number),
            _ => None,
        }
    }

    fn open_tag(self) -> &'static str {
        match self {
            ListKind::Bullet => "<ul>",
            ListKind::Number => "<ol>",
        }
    }

    fn close_tag(self) -> &'static str {
        match self {
            ListKind::Bullet => "</ul>",
            ListKind::Number => "</ol>",
        }
    }
}

/// Open lists, innermost last. Every open list has one `<li>` still open.
#[derive(Default)]
struct ListStack(Vec<ListKind>);

impl ListStack {
    fn close_one(&mut self, out: &mut String) {
        if let Some(kind) = self.0.pop() {
            out.push_str("</li>");
            out.push_str(kind.close_tag());
        }
    }

    fn close_all(&mut self, out: &mut String) {
        while !self.0.is_empty() {
            self.close_one(out);
        }
    }

    /// Positions the output for a new `<li>` of `kind` at nesting `level` (1-based).
    fn enter(&mut self, kind: ListKind, level: usize, out: &mut String) {
        while self.0.len() > level {
            self.close_one(out);
        }
        if self.0.len() == level {
            if self.0.last() == Some(&kind) {
                out.push_str("</li>");
            } else {
                self.close_one(out);
            }
        }
        while self.0.len() < level {
            out.push_str(kind.open_tag());
            self.0.push(kind);
        }
        out.push_str("<li>");
    }
}

/// Only web, mail and phone links are emitted as anchors.
fn is_safe_href(href: &str) -> bool {
    let lower = href.trim().to_ascii_lowercase();
    lower.starts_with("https://")
        || lower.starts_with("http://")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || (lower.starts_with('/') && !lower.starts_with("//"))
        || lower.starts_with('#')
}

fn render_link(def: &MarkDef, inner: String) -> String {
    let Some(href) = def.href.as_deref().filter(|h| is_safe_href(h)) else {
        return inner;
    };
    let target = if def.blank == Some(true) {
        r#" target="_blank" rel="noopener noreferrer""#
    } else {
        ""
    };
    format!(
        r#"<a href="{}"{}>{}</a>"#,
        encode_double_quoted_attribute(href.trim()),
        target,
        inner
    )
}

fn render_span(span: &Span, mark_defs: &[MarkDef]) -> String {
    let mut html = encode_text(&span.text).replace('\n', "<br>");
    for mark in &span.marks {
        html = match mark.as_str() {
            "strong" => format!("<strong>{}</strong>", html),
            "em" => format!("<em>{}</em>", html),
            "code" => format!("<code>{}</code>", html),
            "underline" => format!("<u>{}</u>", html),
            "strike-through" => format!("<s>{}</s>", html),
            key => match mark_defs.iter().find(|d| d.key == key) {
                Some(def) if def.kind == "link" => render_link(def, html),
                _ => html,
            },
        };
    }
    html
}

fn render_children(block: &TextBlock) -> String {
    block
        .children
        .iter()
        .filter(|span| span.kind.as_deref().map_or(true, |k| k == "span"))
        .map(|span| render_span(span, &block.mark_defs))
        .collect()
}

fn render_text_block(block: &TextBlock) -> String {
    let inner = render_children(block);
    let tag = match block.style.as_deref().unwrap_or("normal") {
        "h1" => "h1",
        "h2" => "h2",
        "h3" => "h3",
        "h4" => "h4",
        "blockquote" => "blockquote",
        // `normal` and any style without a dedicated element render as paragraphs.
        _ => "p",
    };
    format!("<{tag}>{inner}</{tag}>")
}

fn render_image(image: &ImageRef, images: &ImageUrlBuilder) -> String {
    let Some(url) = images.image(image) else {
        return String::new();
    };
    let src = url.width(BODY_IMAGE_WIDTH).height(BODY_IMAGE_HEIGHT).url();
    let alt = image.alt.as_deref().unwrap_or_default();

    let mut html = format!(
        r#"<figure class="post-image"><img src="{}" alt="{}" width="{}" height="{}" loading="lazy">"#,
        encode_double_quoted_attribute(&src),
        encode_double_quoted_attribute(alt),
        BODY_IMAGE_WIDTH,
        BODY_IMAGE_HEIGHT
    );
    if !alt.is_empty() {
        html.push_str(&format!("<figcaption>{}</figcaption>", encode_text(alt)));
    }
    html.push_str("</figure>");
    html
}

/// Renders blocks in order. Consecutive list items are grouped into `<ul>`/`<ol>`,
/// nested by their `level`. Block types without a renderer produce no output.
pub fn render_blocks(blocks: &[Block], images: &ImageUrlBuilder) -> String {
    let mut out = String::new();
    let mut lists = ListStack::default();

    for block in blocks {
        if let Block::Text(text) = block {
            if let Some(kind) = text.list_item.as_deref().and_then(ListKind::parse) {
                let level = text.level.unwrap_or(1).clamp(1, MAX_LIST_DEPTH) as usize;
                lists.enter(kind, level, &mut out);
                out.push_str(&render_children(text));
                continue;
            }
        }

        lists.close_all(&mut out);
        match block {
            Block::Text(text) => out.push_str(&render_text_block(text)),
            Block::Image(image) => out.push_str(&render_image(image, images)),
            Block::Unknown(kind) => log::debug!("No renderer for block type '{}'; skipping", kind),
        }
    }

    lists.close_all(&mut out);
    out
}

/// Plain text of a body, used for meta descriptions when a post has no excerpt.
pub fn plain_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .filter_map(|b| match b {
            Block::Text(text) => Some(
                text.children
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect::<String>(),
            ),
            _ => None,
        })
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
