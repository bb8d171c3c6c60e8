use crate::error::{Result, ScanError};
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// Schemes that name a fetchable page.
const WEB_SCHEMES: [&str; 2] = ["http", "https"];

/// Collects the raw `href` values of every anchor, in document order.
///
/// The body is decoded lossily; the HTML parser itself never rejects input.
pub fn extract_hrefs(body: &[u8]) -> Vec<String> {
    let html = String::from_utf8_lossy(body);
    let document = Html::parse_document(&html);

    let link_selector = Selector::parse("a[href]").expect("static selector is valid");

    document
        .select(&link_selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.to_string())
        .collect()
}

/// Resolves `href` against the page it was found on.
///
/// Returns `Ok(None)` for targets outside the web graph (`mailto:`,
/// `javascript:` and friends) and `Err` when the reference cannot be parsed.
pub fn resolve(base: &Url, href: &str) -> Result<Option<String>> {
    let resolved = base
        .join(href)
        .map_err(|e| ScanError::InvalidUrl(format!("{:?} on {}: {}", href, base, e)))?;

    if !WEB_SCHEMES.contains(&resolved.scheme()) {
        debug!("Skipping non-web link {}", resolved);
        return Ok(None);
    }

    Ok(Some(resolved.to_string()))
}

/// Absolute URLs of every anchor on the page. The first unresolvable
/// `href` fails the whole extraction.
pub fn extract_links(body: &[u8], base_url: &str) -> Result<Vec<String>> {
    let base = Url::parse(base_url)
        .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", base_url, e)))?;

    let mut links = Vec::new();
    for href in extract_hrefs(body) {
        if let Some(link) = resolve(&base, &href)? {
            links.push(link);
        }
    }

    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://example.com/docs/index.html").unwrap()
    }

    #[test]
    fn test_extract_hrefs_in_document_order() {
        let body = br#"<html><body>
            <a href="/b">B</a>
            <div><a href="a.html">A</a></div>
            <a name="anchor-without-href">x</a>
            <a href="https://other.org/">Other</a>
        </body></html>"#;

        let hrefs = extract_hrefs(body);
        assert_eq!(hrefs, vec!["/b", "a.html", "https://other.org/"]);
    }

    #[test]
    fn test_extract_hrefs_tolerates_broken_markup() {
        let body = b"<a href='/x'>unclosed <p><a href=/y>bare";
        assert_eq!(extract_hrefs(body), vec!["/x", "/y"]);
    }

    #[test]
    fn test_extract_hrefs_non_utf8_body() {
        let mut body = b"<a href=\"/ok\">".to_vec();
        body.extend_from_slice(&[0xff, 0xfe, 0xfd]);
        body.extend_from_slice(b"</a>");
        assert_eq!(extract_hrefs(&body), vec!["/ok"]);
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve(&base(), "guide.html").unwrap(),
            Some("http://example.com/docs/guide.html".to_string())
        );
        assert_eq!(
            resolve(&base(), "../about").unwrap(),
            Some("http://example.com/about".to_string())
        );
        assert_eq!(
            resolve(&base(), "/").unwrap(),
            Some("http://example.com/".to_string())
        );
    }

    #[test]
    fn test_resolve_keeps_fragment_and_query() {
        assert_eq!(
            resolve(&base(), "#top").unwrap(),
            Some("http://example.com/docs/index.html#top".to_string())
        );
        assert_eq!(
            resolve(&base(), "search?q=rust").unwrap(),
            Some("http://example.com/docs/search?q=rust".to_string())
        );
    }

    #[test]
    fn test_resolve_absolute_other_host() {
        assert_eq!(
            resolve(&base(), "https://rust-lang.org/learn").unwrap(),
            Some("https://rust-lang.org/learn".to_string())
        );
    }

    #[test]
    fn test_resolve_skips_non_web_schemes() {
        assert_eq!(resolve(&base(), "mailto:someone@example.com").unwrap(), None);
        assert_eq!(resolve(&base(), "javascript:void(0)").unwrap(), None);
        assert_eq!(resolve(&base(), "tel:+15555550100").unwrap(), None);
    }

    #[test]
    fn test_resolve_invalid_href() {
        let result = resolve(&base(), "http://[::1");
        assert!(matches!(result, Err(ScanError::InvalidUrl(_))));
    }

    #[test]
    fn test_extract_links_resolves_against_base() {
        let body = br#"<a href="a">A</a><a href="mailto:x@y.z">mail</a><a href="/b">B</a>"#;
        let links = extract_links(body, "http://example.com/dir/").unwrap();
        assert_eq!(
            links,
            vec!["http://example.com/dir/a", "http://example.com/b"]
        );
    }

    #[test]
    fn test_extract_links_fails_on_bad_href() {
        let body = br#"<a href="/fine">ok</a><a href="http://[::1">bad</a>"#;
        assert!(extract_links(body, "http://example.com/").is_err());
    }

    #[test]
    fn test_extract_links_bad_base() {
        assert!(matches!(
            extract_links(b"", "not a url"),
            Err(ScanError::InvalidUrl(_))
        ));
    }
}
