use crate::fetch::Document;
use crate::location::Location;
use scraper::{Html, Selector};
use tracing::debug;

/// Extract outbound anchor references from `markup`, resolved against `origin`.
///
/// Document order is preserved and nothing is deduplicated here; the graph
/// collapses duplicates. Malformed markup is parsed leniently and never fails.
pub fn extract_links(markup: &str, origin: &Location) -> Vec<Location> {
    let Ok(link_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(markup);
    let mut links = Vec::new();

    for element in document.select(&link_selector) {
        if let Some(href) = element.value().attr("href")
            && let Some(target) = origin.resolve(href)
        {
            debug!("Found link: {} -> {}", origin, target);
            links.push(target);
        }
    }

    links
}

/// Links for a fetched document, resolved against the address the body was
/// served from. Non-markup content contributes nothing.
pub fn extract_document_links(document: &Document) -> Vec<Location> {
    if !document.is_html() {
        debug!(
            "Skipping link extraction for {} ({:?})",
            document.location, document.content_type
        );
        return Vec::new();
    }
    extract_links(&document.body, &document.base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn loc(s: &str) -> Location {
        Location::parse(s).unwrap()
    }

    fn strings(links: &[Location]) -> Vec<&str> {
        links.iter().map(|l| l.as_str()).collect()
    }

    #[test]
    fn test_extracts_in_document_order() {
        let html = r#"<html><body>
            <a href="/b">B</a>
            <p><a href="https://other.org/x">X</a></p>
            <a href="c">C</a>
        </body></html>"#;
        let links = extract_links(html, &loc("http://h/dir/a"));
        assert_eq!(
            strings(&links),
            vec!["http://h/b", "https://other.org/x", "http://h/dir/c"]
        );
    }

    #[test]
    fn test_ignores_anchors_without_href_and_non_resources() {
        let html = r##"<a name="top">anchor</a>
            <a href="#top">skip</a>
            <a href="mailto:me@h">mail</a>
            <a href="javascript:void(0)">js</a>
            <a href="">empty</a>
            <link href="/style.css">
            <a href="/kept">kept</a>"##;
        let links = extract_links(html, &loc("http://h/"));
        assert_eq!(strings(&links), vec!["http://h/kept"]);
    }

    #[test]
    fn test_keeps_duplicates_for_graph_to_collapse() {
        let html = r#"<a href="/b">1</a><a href="/b#x">2</a><a href="http://h/b">3</a>"#;
        let links = extract_links(html, &loc("http://h/a"));
        assert_eq!(links.len(), 3);
        assert!(links.iter().all(|l| l.as_str() == "http://h/b"));
    }

    #[test]
    fn test_malformed_markup_degrades_gracefully() {
        let links = extract_links("<a href='/ok'>ok<div><<<>>< a href=", &loc("http://h/"));
        assert_eq!(strings(&links), vec!["http://h/ok"]);

        assert!(extract_links("", &loc("http://h/")).is_empty());
        assert!(extract_links("\u{0}\u{1}binary\u{fffd}", &loc("http://h/")).is_empty());
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let html = r#"<a href="/1">1</a><a href="/2">2</a>"#;
        let origin = loc("http://h/");
        assert_eq!(extract_links(html, &origin), extract_links(html, &origin));
    }

    #[test]
    fn test_non_html_document_has_no_links() {
        let doc = Document {
            location: loc("http://h/data.json"),
            base: loc("http://h/data.json"),
            status_code: 200,
            content_type: Some("application/json".to_string()),
            body: r#"<a href="/b">not markup</a>"#.to_string(),
            response_time: Duration::ZERO,
        };
        assert!(extract_document_links(&doc).is_empty());

        let html_doc = Document {
            content_type: Some("text/html".to_string()),
            ..doc
        };
        assert_eq!(strings(&extract_document_links(&html_doc)), vec!["http://h/b"]);
    }

    #[test]
    fn test_relative_links_resolve_against_redirect_target() {
        let doc = Document {
            location: loc("http://h/docs"),
            base: loc("http://h/docs/"),
            status_code: 200,
            content_type: Some("text/html".to_string()),
            body: r#"<a href="intro">intro</a>"#.to_string(),
            response_time: Duration::ZERO,
        };
        assert_eq!(strings(&extract_document_links(&doc)), vec!["http://h/docs/intro"]);
    }
}
