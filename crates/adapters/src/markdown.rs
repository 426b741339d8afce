//! DOM-to-Markdown conversion. Operates on an already-cleaned subtree
//! (the caller has already picked `<main>`/`<article>`/`<body>` and
//! passes that element in); this module's own job is dropping
//! non-content tags during the walk and rendering what remains.

use scraper::node::Element;
use scraper::{ElementRef, Node};

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Class/id substrings matching common ad/tracking containers. A
/// heuristic, not a perfect ad-blocker — good enough to keep obvious
/// boilerplate out of indexed Markdown.
const AD_LIKE_HINTS: &[&str] = &[
    "advert", "ad-slot", "ad-banner", "adsbygoogle", "sponsor", "cookie-banner", "cookie-consent",
    "newsletter-signup", "popup", "modal-overlay",
];

fn is_skipped(element: &Element) -> bool {
    SKIPPED_TAGS.contains(&element.name())
}

fn is_ad_like(element: &Element) -> bool {
    let id = element.id().unwrap_or("");
    if AD_LIKE_HINTS.iter().any(|hint| id.contains(hint)) {
        return true;
    }
    element
        .classes()
        .any(|class| AD_LIKE_HINTS.iter().any(|hint| class.contains(hint)))
}

/// Render an element and its descendants as Markdown.
pub fn to_markdown(root: ElementRef) -> String {
    let mut out = String::new();
    render_children(root, &mut out, 0, false);
    normalise_blank_lines(&out)
}

fn render_children(el: ElementRef, out: &mut String, list_depth: usize, ordered: bool) {
    let mut index = 1usize;
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&collapse_whitespace(text)),
            Node::Element(element) => {
                if is_skipped(element) || is_ad_like(element) {
                    continue;
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    render_element(child_ref, element, out, list_depth, ordered, &mut index);
                }
            }
            _ => {}
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn render_element(
    el: ElementRef,
    element: &Element,
    out: &mut String,
    list_depth: usize,
    ordered: bool,
    index: &mut usize,
) {
    match element.name() {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = element.name()[1..].parse::<usize>().unwrap_or(1);
            ensure_blank_line(out);
            out.push_str(&"#".repeat(level));
            out.push(' ');
            render_children(el, out, list_depth, ordered);
            out.push('\n');
        }
        "p" | "div" | "section" | "article" | "header" | "footer" | "figure" => {
            ensure_blank_line(out);
            render_children(el, out, list_depth, ordered);
            ensure_blank_line(out);
        }
        "br" => out.push('\n'),
        "hr" => {
            ensure_blank_line(out);
            out.push_str("---\n");
        }
        "strong" | "b" => {
            out.push_str("**");
            render_children(el, out, list_depth, ordered);
            out.push_str("**");
        }
        "em" | "i" => {
            out.push('_');
            render_children(el, out, list_depth, ordered);
            out.push('_');
        }
        "code" => {
            out.push('`');
            render_children(el, out, list_depth, ordered);
            out.push('`');
        }
        "pre" => {
            ensure_blank_line(out);
            out.push_str("```\n");
            let mut body = String::new();
            render_children(el, &mut body, list_depth, ordered);
            out.push_str(body.trim_end());
            out.push_str("\n```\n");
        }
        "a" => {
            let href = element.attr("href").unwrap_or("");
            out.push('[');
            render_children(el, out, list_depth, ordered);
            out.push_str("](");
            out.push_str(href);
            out.push(')');
        }
        "img" => {
            let src = element.attr("src").unwrap_or("");
            let alt = element.attr("alt").unwrap_or("");
            out.push_str(&format!("![{alt}]({src})"));
        }
        "ul" => {
            ensure_blank_line(out);
            render_list(el, out, list_depth, false);
            ensure_blank_line(out);
        }
        "ol" => {
            ensure_blank_line(out);
            render_list(el, out, list_depth, true);
            ensure_blank_line(out);
        }
        "li" => {
            out.push_str(&"  ".repeat(list_depth));
            if ordered {
                out.push_str(&format!("{index}. "));
                *index += 1;
            } else {
                out.push_str("- ");
            }
            render_children(el, out, list_depth + 1, ordered);
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }
        "blockquote" => {
            ensure_blank_line(out);
            let mut body = String::new();
            render_children(el, &mut body, list_depth, ordered);
            for line in body.trim().lines() {
                out.push_str("> ");
                out.push_str(line);
                out.push('\n');
            }
            ensure_blank_line(out);
        }
        "table" => {
            ensure_blank_line(out);
            render_table(el, out);
            ensure_blank_line(out);
        }
        _ => render_children(el, out, list_depth, ordered),
    }
}

fn render_list(el: ElementRef, out: &mut String, depth: usize, ordered: bool) {
    let mut index = 1usize;
    for child in el.children() {
        if let Node::Element(element) = child.value() {
            if element.name() == "li" {
                if let Some(item) = ElementRef::wrap(child) {
                    render_element(item, element, out, depth, ordered, &mut index);
                }
            }
        }
    }
}

fn render_table(el: ElementRef, out: &mut String) {
    let rows: Vec<ElementRef> = el
        .children()
        .filter_map(|c| ElementRef::wrap(c))
        .flat_map(|section| {
            if matches!(section.value().name(), "thead" | "tbody" | "tfoot") {
                section.children().filter_map(ElementRef::wrap).collect::<Vec<_>>()
            } else if section.value().name() == "tr" {
                vec![section]
            } else {
                Vec::new()
            }
        })
        .collect();

    for (row_index, row) in rows.iter().enumerate() {
        let cells: Vec<String> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| matches!(c.value().name(), "td" | "th"))
            .map(|cell| {
                let mut text = String::new();
                render_children(cell, &mut text, 0, false);
                text.trim().replace('\n', " ")
            })
            .collect();
        if cells.is_empty() {
            continue;
        }
        out.push_str("| ");
        out.push_str(&cells.join(" | "));
        out.push_str(" |\n");
        if row_index == 0 {
            out.push_str("| ");
            out.push_str(&vec!["---"; cells.len()].join(" | "));
            out.push_str(" |\n");
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::new();
    let mut last_was_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out
}

fn ensure_blank_line(out: &mut String) {
    if out.is_empty() {
        return;
    }
    if !out.ends_with("\n\n") {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
}

fn normalise_blank_lines(text: &str) -> String {
    let mut out = String::new();
    let mut blank_run = 0;
    for line in text.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.trim().to_string()
}

/// Plain-text fallback used when Markdown conversion yields nothing
/// (e.g. the page is a single `<pre>` blob of unstructured text) and
/// the caller has opted into it.
pub fn strip_to_text(html: &str) -> String {
    let doc = scraper::Html::parse_fragment(html);
    let mut out = String::new();
    collect_text(doc.root_element(), &mut out);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(el: ElementRef, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(element) => {
                if is_skipped(element) {
                    continue;
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(child_ref, out);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "markdown_tests.rs"]
mod tests;
