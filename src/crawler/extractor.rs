//! Page extractor: HTML to text blocks and same-host links
//!
//! Extraction is pure. The same bytes, page URL and scope always produce the
//! same text and the same link set.
//!
//! # Text format
//!
//! | Element | Block |
//! |---------|-------|
//! | `<h1>`..`<h6>` | blank line, `#` × level, space, text, newline |
//! | `<p>` | text, newline |
//! | `<li>` inside `<ul>` | `- `, text, newline; a lone newline closes each list |
//! | `<blockquote>` | `> `, text, newline |
//!
//! Blocks are joined with newlines and the result is trimmed. Under
//! [`TextOrder::Grouped`] all headings come first, then all paragraphs, then
//! all lists, then all blockquotes, regardless of where they sit on the page.

use crate::config::TextOrder;
use crate::url::{is_in_scope, resolve_link};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use url::Url;

const HEADING_SELECTOR: &str = "h1, h2, h3, h4, h5, h6";

/// Text and links extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Formatted text content
    pub text: String,

    /// Same-host links found on the page, deduplicated
    pub links: BTreeSet<Url>,
}

/// Turns fetched HTML into text and links
#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor {
    order: TextOrder,
}

impl Extractor {
    pub fn new(order: TextOrder) -> Self {
        Self { order }
    }

    pub fn order(&self) -> TextOrder {
        self.order
    }

    /// Extracts text and in-scope links from a page
    ///
    /// # Arguments
    ///
    /// * `html` - The page body
    /// * `page_url` - The URL the page was served from
    /// * `scope` - The crawl's seed URL; only links on its host are kept
    ///
    /// # Example
    ///
    /// ```
    /// use sitescrape::crawler::Extractor;
    /// use url::Url;
    ///
    /// let html = r#"<h1>Title</h1><p>Body</p><a href="/next">next</a>"#;
    /// let page = Url::parse("https://example.com/").unwrap();
    /// let extracted = Extractor::default().extract(html, &page, &page);
    ///
    /// assert_eq!(extracted.text, "# Title\n\nBody");
    /// assert_eq!(extracted.links.len(), 1);
    /// ```
    pub fn extract(&self, html: &str, page_url: &Url, scope: &Url) -> ExtractedPage {
        let document = Html::parse_document(html);

        let blocks = match self.order {
            TextOrder::Grouped => grouped_blocks(&document),
            TextOrder::Document => document_blocks(&document),
        };

        let base_url = base_url(&document, page_url);

        ExtractedPage {
            text: blocks.join("\n").trim().to_string(),
            links: extract_links(&document, &base_url, scope),
        }
    }
}

/// Collects blocks category by category
fn grouped_blocks(document: &Html) -> Vec<String> {
    let mut blocks = Vec::new();

    if let Ok(selector) = Selector::parse(HEADING_SELECTOR) {
        for heading in document.select(&selector) {
            blocks.push(heading_block(&heading));
        }
    }

    if let Ok(selector) = Selector::parse("p") {
        for paragraph in document.select(&selector) {
            blocks.push(paragraph_block(&paragraph));
        }
    }

    if let Ok(selector) = Selector::parse("ul") {
        for list in document.select(&selector) {
            push_list_blocks(&list, &mut blocks);
        }
    }

    if let Ok(selector) = Selector::parse("blockquote") {
        for quote in document.select(&selector) {
            blocks.push(quote_block(&quote));
        }
    }

    blocks
}

/// Collects the same blocks in document order
fn document_blocks(document: &Html) -> Vec<String> {
    let mut blocks = Vec::new();

    let Ok(selector) = Selector::parse("h1, h2, h3, h4, h5, h6, p, ul, blockquote") else {
        return blocks;
    };

    for element in document.select(&selector) {
        match element.value().name() {
            "p" => blocks.push(paragraph_block(&element)),
            "ul" => push_list_blocks(&element, &mut blocks),
            "blockquote" => blocks.push(quote_block(&element)),
            _ => blocks.push(heading_block(&element)),
        }
    }

    blocks
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn heading_block(heading: &ElementRef) -> String {
    let level = heading.value().name()[1..].parse::<usize>().unwrap_or(1);
    format!("\n{} {}\n", "#".repeat(level), element_text(heading))
}

fn paragraph_block(paragraph: &ElementRef) -> String {
    format!("{}\n", element_text(paragraph))
}

fn quote_block(quote: &ElementRef) -> String {
    format!("> {}\n", element_text(quote))
}

/// Every `<li>` under the list, nested ones included, then a separator
fn push_list_blocks(list: &ElementRef, blocks: &mut Vec<String>) {
    if let Ok(selector) = Selector::parse("li") {
        for item in list.select(&selector) {
            blocks.push(format!("- {}\n", element_text(&item)));
        }
    }
    blocks.push("\n".to_string());
}

/// The page's base URL: the first `<base href>` if present, else the page URL
fn base_url(document: &Html, page_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|base| base.value().attr("href"))
                .and_then(|href| page_url.join(href).ok())
        })
        .unwrap_or_else(|| page_url.clone())
}

/// Resolves every `<a href>` and keeps the ones on the scope's host
fn extract_links(document: &Html, base_url: &Url, scope: &Url) -> BTreeSet<Url> {
    let mut links = BTreeSet::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for anchor in document.select(&selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };

            if let Some(link) = resolve_link(href, base_url) {
                if is_in_scope(scope, &link) {
                    links.insert(link);
                }
            }
        }
    }

    links
}
