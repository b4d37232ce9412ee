//! Rendered-DOM helpers: navigation discovery and the markdown-flavoured
//! text reducer.
//!
//! Both work on a serialized document snapshot, so they are pure and can be
//! exercised without a browser.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::route::fragment_of;

/// Candidate content roots, most specific first.
pub const CONTENT_ROOT_SELECTORS: [&str; 4] = ["main", "[role=\"main\"]", ".content", "article"];

/// Anchors under a `nav` landmark that point at a fragment, or any anchor
/// carrying the section key marker.
pub const NAV_LINK_SELECTOR: &str = "nav a[href^=\"#\"], a[href*=\"#s=\"]";

const SKIPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

static LANGUAGE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"language-(\w+)").expect("language class regex compiles"));
static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("newline run regex compiles"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    pub url: String,
    pub fragment: String,
}

/// Collect every navigation target in `document_html`, deduplicated by
/// absolute URL and kept in first-seen document order.
pub fn discover_targets(document_html: &str, page_url: &str) -> Vec<NavigationTarget> {
    let Ok(selector) = Selector::parse(NAV_LINK_SELECTOR) else {
        return Vec::new();
    };
    let base = Url::parse(page_url).ok();
    let document = Html::parse_document(document_html);

    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let url = match &base {
            Some(base) => match base.join(href) {
                Ok(joined) => joined.to_string(),
                Err(_) => continue,
            },
            None => href.to_string(),
        };
        let Some(fragment) = fragment_of(&url).map(ToOwned::to_owned) else {
            continue;
        };
        if seen.insert(url.clone()) {
            targets.push(NavigationTarget { url, fragment });
        }
    }

    targets
}

/// First element matching one of [`CONTENT_ROOT_SELECTORS`].
pub fn content_root(document: &Html) -> Option<ElementRef<'_>> {
    CONTENT_ROOT_SELECTORS
        .iter()
        .filter_map(|raw| Selector::parse(raw).ok())
        .find_map(|selector| document.select(&selector).next())
}

/// Reduce the content root of `document_html` to normalized text.
///
/// Returns `None` when no content root resolves.
pub fn reduce_document(document_html: &str) -> Option<String> {
    let document = Html::parse_document(document_html);
    content_root(&document).map(reduce_element)
}

pub fn reduce_element(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    walk(root, 0, &mut out);
    EXCESS_NEWLINES.replace_all(&out, "\n\n").trim().to_string()
}

fn walk(element: ElementRef<'_>, depth: usize, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let text = text.trim();
            if !text.is_empty() {
                out.push_str(text);
                out.push(' ');
            }
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        emit_element(child, depth, out);
    }
}

fn emit_element(element: ElementRef<'_>, depth: usize, out: &mut String) {
    let tag = element.value().name();

    if let Some(level) = heading_level(tag) {
        out.push_str("\n\n");
        out.push_str(&"#".repeat(level));
        out.push(' ');
        out.push_str(&text_content(element));
        out.push_str("\n\n");
        return;
    }

    match tag {
        "p" => {
            out.push_str("\n\n");
            out.push_str(&text_content(element));
            out.push_str("\n\n");
        }
        "li" => {
            out.push('\n');
            out.push_str(&"  ".repeat(depth.max(1)));
            out.push_str("* ");
            out.push_str(&text_content(element));
        }
        "ul" | "ol" => {
            out.push('\n');
            walk(element, depth + 1, out);
        }
        "code" => {
            out.push('`');
            out.push_str(&text_content(element));
            out.push('`');
        }
        "strong" | "b" => {
            out.push_str("**");
            out.push_str(&text_content(element));
            out.push_str("**");
        }
        "em" | "i" => {
            out.push('*');
            out.push_str(&text_content(element));
            out.push('*');
        }
        "a" => {
            let text = text_content(element);
            match element.value().attr("href") {
                Some(href) if !href.starts_with('#') => {
                    out.push('[');
                    out.push_str(&text);
                    out.push_str("](");
                    out.push_str(href);
                    out.push(')');
                }
                _ => out.push_str(&text),
            }
        }
        "pre" => {
            out.push_str("\n\n```");
            out.push_str(&code_language(element).unwrap_or_default());
            out.push('\n');
            out.push_str(&text_content(element));
            out.push_str("\n```\n\n");
        }
        "blockquote" => {
            let quoted = text_content(element)
                .lines()
                .map(|line| format!("> {line}"))
                .collect::<Vec<String>>()
                .join("\n");
            out.push_str("\n\n");
            out.push_str(&quoted);
            out.push_str("\n\n");
        }
        "img" => {
            let attr = |name: &str| element.value().attr(name).unwrap_or_default();
            out.push_str(&format!("![{}]({})", attr("alt"), attr("src")));
        }
        tag if SKIPPED_TAGS.contains(&tag) => {}
        _ => walk(element, depth, out),
    }
}

fn heading_level(tag: &str) -> Option<usize> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn code_language(pre: ElementRef<'_>) -> Option<String> {
    let selector = Selector::parse("code").ok()?;
    let code = pre.select(&selector).next()?;
    let class = code.value().attr("class")?;
    LANGUAGE_CLASS
        .captures(class)
        .and_then(|captures| captures.get(1))
        .map(|lang| lang.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reduce(body: &str) -> Option<String> {
        reduce_document(&format!("<html><body>{body}</body></html>"))
    }

    #[test]
    fn discovery_dedups_and_keeps_document_order() {
        let html = r##"
            <html><body>
              <nav>
                <a href="#s=intro&ss=welcome">Welcome</a>
                <a href="#overview">Overview</a>
                <a href="/elsewhere">Elsewhere</a>
              </nav>
              <main>
                <a href="#s=intro&ss=welcome">Again</a>
                <a href="https://docs.example/docs#s=api&ss=auth">Auth</a>
                <a href="#not-nav">Inline</a>
              </main>
            </body></html>
        "##;
        let targets = discover_targets(html, "https://docs.example/docs#s=intro&ss=welcome");
        let urls = targets.iter().map(|t| t.url.as_str()).collect::<Vec<_>>();
        assert_eq!(
            urls,
            vec![
                "https://docs.example/docs#s=intro&ss=welcome",
                "https://docs.example/docs#overview",
                "https://docs.example/docs#s=api&ss=auth",
            ]
        );
        assert_eq!(targets[1].fragment, "overview");
    }

    #[test]
    fn discovery_on_page_without_links_is_empty() {
        let html = "<html><body><p>x</p></body></html>";
        assert!(discover_targets(html, "https://a.example/").is_empty());
    }

    #[test]
    fn content_root_prefers_main_over_article() {
        let html = "<html><body><article><p>article</p></article><main><p>main</p></main></body></html>";
        assert_eq!(reduce_document(html).as_deref(), Some("main"));
    }

    #[test]
    fn content_root_falls_back_through_candidates() {
        assert_eq!(
            reduce(r#"<div role="main"><p>role</p></div>"#).as_deref(),
            Some("role")
        );
        assert_eq!(
            reduce(r#"<div class="wrapper content"><p>classy</p></div>"#).as_deref(),
            Some("classy")
        );
        assert_eq!(reduce("<article><p>art</p></article>").as_deref(), Some("art"));
    }

    #[test]
    fn no_content_root_is_none() {
        assert_eq!(reduce("<div><p>orphan</p></div>"), None);
    }

    #[test]
    fn headings_carry_their_level() {
        for level in 1..=6 {
            let out = reduce(&format!("<main><h{level}> Title </h{level}></main>"))
                .expect("content root");
            assert_eq!(out, format!("{} Title", "#".repeat(level)));
        }
    }

    #[test]
    fn structural_rules_render_markdown() {
        let html = r##"
            <main>
              <h1>Install</h1>
              <p>Run the <code>setup</code> script.</p>
              <ul><li>first</li><li>second</li></ul>
              <strong>bold</strong> <em>soft</em>
              <a href="https://x.example/">external</a>
              <a href="#s=nav&ss=chrome">chrome</a>
              <pre><code class="hljs language-rust">fn main() {}</code></pre>
              <blockquote>one
two</blockquote>
              <img alt="logo" src="/logo.png">
              <script>window.noise = 1;</script>
            </main>
        "##;
        let out = reduce(html).expect("content root");
        assert_eq!(
            out,
            "# Install\n\nRun the setup script.\n\n  * first\n  * second**bold***soft*[external](https://x.example/)chrome\n\n```rust\nfn main() {}\n```\n\n> one\n> two\n\n![logo](/logo.png)"
        );
    }

    #[test]
    fn output_never_has_three_newlines_in_a_row() {
        let html = "<main><p>a</p><p></p><p></p><h2>b</h2><ul></ul><ol></ol><p>c</p></main>";
        let out = reduce(html).expect("content root");
        assert!(!out.contains("\n\n\n"), "{out:?}");
        assert_eq!(out, "a\n\n## b\n\nc");
    }

    #[test]
    fn reducer_is_stateless_across_calls() {
        let html = "<main><h2>Same</h2><p>body</p></main>";
        let first = reduce(html);
        let _ = reduce("<main><ul><li>other</li></ul></main>");
        assert_eq!(reduce(html), first);
    }

    #[test]
    fn pre_without_language_class_has_bare_fence() {
        let out = reduce("<main><pre>plain text</pre></main>").expect("content root");
        assert_eq!(out, "```\nplain text\n```");
    }
}
