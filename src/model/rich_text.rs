use std::fmt::Write;

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum Block {
    #[serde(rename = "paragraph")]
    Paragraph(TextBlock),
    #[serde(rename = "heading1")]
    Heading1(TextBlock),
    #[serde(rename = "heading2")]
    Heading2(TextBlock),
    #[serde(rename = "heading3")]
    Heading3(TextBlock),
    #[serde(rename = "heading4")]
    Heading4(TextBlock),
    #[serde(rename = "heading5")]
    Heading5(TextBlock),
    #[serde(rename = "heading6")]
    Heading6(TextBlock),
    #[serde(rename = "preformatted")]
    Preformatted(TextBlock),
    #[serde(rename = "list-item")]
    ListItem(TextBlock),
    #[serde(rename = "o-list-item")]
    OrderedListItem(TextBlock),
    #[serde(rename = "image")]
    Image(ImageBlock),
    #[serde(rename = "embed")]
    Embed(EmbedBlock),
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Default)]
pub struct TextBlock {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ImageBlock {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct EmbedBlock {
    pub oembed: OEmbed,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct OEmbed {
    pub embed_url: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Inline formatting over `text`. Offsets count UTF-16 code units.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(flatten)]
    pub kind: SpanKind,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink {
        #[serde(default)]
        data: LinkData,
    },
    Label {
        #[serde(default)]
        data: LabelData,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Default)]
pub struct LinkData {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Default)]
pub struct LabelData {
    pub label: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

impl Block {
    pub fn text(&self) -> Option<&str> {
        match self {
            Block::Paragraph(block)
            | Block::Heading1(block)
            | Block::Heading2(block)
            | Block::Heading3(block)
            | Block::Heading4(block)
            | Block::Heading5(block)
            | Block::Heading6(block)
            | Block::Preformatted(block)
            | Block::ListItem(block)
            | Block::OrderedListItem(block) => Some(&block.text),
            Block::Image(_) | Block::Embed(_) | Block::Unknown => None,
        }
    }

    fn list_kind(&self) -> Option<ListKind> {
        match self {
            Block::ListItem(_) => Some(ListKind::Unordered),
            Block::OrderedListItem(_) => Some(ListKind::Ordered),
            _ => None,
        }
    }
}

/// Plain text of every text-bearing block, joined with a space.
pub fn as_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .filter_map(Block::text)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn as_html(blocks: &[Block]) -> String {
    let mut html = String::new();
    let mut open_list = None;

    for block in blocks {
        let list_kind = block.list_kind();
        if open_list != list_kind {
            if let Some(kind) = open_list {
                let _ = write!(html, "</{}>", kind.tag());
            }
            if let Some(kind) = list_kind {
                let _ = write!(html, "<{}>", kind.tag());
            }
            open_list = list_kind;
        }

        match block {
            Block::Paragraph(text) => push_text_element(&mut html, "p", text),
            Block::Heading1(text) => push_text_element(&mut html, "h1", text),
            Block::Heading2(text) => push_text_element(&mut html, "h2", text),
            Block::Heading3(text) => push_text_element(&mut html, "h3", text),
            Block::Heading4(text) => push_text_element(&mut html, "h4", text),
            Block::Heading5(text) => push_text_element(&mut html, "h5", text),
            Block::Heading6(text) => push_text_element(&mut html, "h6", text),
            Block::Preformatted(text) => push_text_element(&mut html, "pre", text),
            Block::ListItem(text) | Block::OrderedListItem(text) => {
                push_text_element(&mut html, "li", text)
            }

            Block::Image(image) => {
                if let Some(src) = safe_href(&image.url) {
                    let _ = write!(
                        html,
                        r#"<p class="block-img"><img src="{}" alt="{}"></p>"#,
                        html_escape::encode_double_quoted_attribute(src),
                        html_escape::encode_double_quoted_attribute(
                            image.alt.as_deref().unwrap_or("")
                        ),
                    );
                }
            }

            Block::Embed(embed) => {
                if let Some(href) = safe_href(&embed.oembed.embed_url) {
                    let title = embed.oembed.title.as_deref().unwrap_or(href);
                    let _ = write!(
                        html,
                        r#"<div class="embed"><a href="{}">{}</a></div>"#,
                        html_escape::encode_double_quoted_attribute(href),
                        html_escape::encode_text(title),
                    );
                }
            }

            Block::Unknown => {}
        }
    }

    if let Some(kind) = open_list {
        let _ = write!(html, "</{}>", kind.tag());
    }

    html
}

fn push_text_element(html: &mut String, tag: &str, block: &TextBlock) {
    let _ = write!(html, "<{tag}>");
    push_inline(html, &block.text, &block.spans);
    let _ = write!(html, "</{tag}>");
}

struct ResolvedSpan {
    start: usize,
    end: usize,
    open: String,
    close: &'static str,
    order: usize,
}

fn resolve_span(text: &str, order: usize, span: &Span) -> Option<ResolvedSpan> {
    let start = byte_offset(text, span.start);
    let end = byte_offset(text, span.end);
    if start >= end {
        return None;
    }

    let (open, close) = match &span.kind {
        SpanKind::Strong => ("<strong>".to_string(), "</strong>"),
        SpanKind::Em => ("<em>".to_string(), "</em>"),
        SpanKind::Hyperlink { data } => {
            let href = data.url.as_deref().and_then(safe_href)?;
            (
                format!(
                    r#"<a href="{}">"#,
                    html_escape::encode_double_quoted_attribute(href)
                ),
                "</a>",
            )
        }
        SpanKind::Label { data } => (
            format!(
                r#"<span class="{}">"#,
                html_escape::encode_double_quoted_attribute(&data.label)
            ),
            "</span>",
        ),
        SpanKind::Unknown => return None,
    };

    Some(ResolvedSpan {
        start,
        end,
        open,
        close,
        order,
    })
}

/// Writes `text` with its spans applied. Overlapping spans that do not nest
/// are split so the emitted tags always nest properly.
fn push_inline(html: &mut String, text: &str, spans: &[Span]) {
    let mut spans = spans
        .iter()
        .enumerate()
        .filter_map(|(order, span)| resolve_span(text, order, span))
        .collect::<Vec<_>>();
    // outer spans first: earlier start, then longer
    spans.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(b.end.cmp(&a.end))
            .then(a.order.cmp(&b.order))
    });

    let mut boundaries = vec![0, text.len()];
    for span in &spans {
        boundaries.push(span.start);
        boundaries.push(span.end);
    }
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut stack: Vec<&ResolvedSpan> = Vec::new();
    let mut next_span = 0;

    for window in boundaries.windows(2) {
        let (at, until) = (window[0], window[1]);

        if let Some(lowest) = stack.iter().position(|span| span.end <= at) {
            let mut reopen = Vec::new();
            while stack.len() > lowest {
                if let Some(span) = stack.pop() {
                    html.push_str(span.close);
                    if span.end > at {
                        reopen.push(span);
                    }
                }
            }
            for span in reopen.into_iter().rev() {
                html.push_str(&span.open);
                stack.push(span);
            }
        }

        while next_span < spans.len() && spans[next_span].start == at {
            let span = &spans[next_span];
            html.push_str(&span.open);
            stack.push(span);
            next_span += 1;
        }

        push_escaped(html, &text[at..until]);
    }

    while let Some(span) = stack.pop() {
        html.push_str(span.close);
    }
}

fn push_escaped(html: &mut String, text: &str) {
    let mut lines = text.split('\n');
    if let Some(first) = lines.next() {
        html.push_str(&html_escape::encode_text(first));
    }
    for line in lines {
        html.push_str("<br />");
        html.push_str(&html_escape::encode_text(line));
    }
}

/// Maps a UTF-16 offset onto a byte offset of `text`, clamped to a char
/// boundary inside the string.
fn byte_offset(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (index, ch) in text.char_indices() {
        if units >= utf16_offset {
            return index;
        }
        units += ch.len_utf16();
    }
    text.len()
}

fn safe_href(url: &str) -> Option<&str> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https" | "mailto") => Some(url),
        Ok(_) => None,
        Err(url::ParseError::RelativeUrlWithoutBase) => Some(url),
        Err(_) => None,
    }
}
