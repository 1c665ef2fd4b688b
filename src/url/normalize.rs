use crate::UrlError;
use url::Url;

/// Reduces a listing URL to its canonical form
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an HTTP or HTTPS scheme and a host
/// 3. Remove the query string
/// 4. Remove the fragment
///
/// Two URLs that differ only by query string canonicalize to the same value.
///
/// # Examples
///
/// ```
/// use rental_harvest::url::canonicalize_url;
///
/// let url = canonicalize_url("https://www.airbnb.com/rooms/42?adults=2&check_in=2024-01-01").unwrap();
/// assert_eq!(url.as_str(), "https://www.airbnb.com/rooms/42");
/// ```
pub fn canonicalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Resolves an href read from the page against the site root
///
/// Search results and host links are rendered as root-relative paths
/// (`/rooms/42?...`); absolute hrefs are returned unchanged. The query
/// string is preserved here, canonicalization happens downstream.
pub fn resolve_href(base: &Url, href: &str) -> Result<Url, UrlError> {
    let href = href.trim();
    if href.is_empty() {
        return Err(UrlError::Parse("empty href".to_string()));
    }

    base.join(href).map_err(|e| UrlError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_query() {
        let url = canonicalize_url("https://www.airbnb.com/rooms/42?x=1").unwrap();
        assert_eq!(url.as_str(), "https://www.airbnb.com/rooms/42");
    }

    #[test]
    fn test_strip_fragment() {
        let url = canonicalize_url("https://www.airbnb.com/rooms/42#photos").unwrap();
        assert_eq!(url.as_str(), "https://www.airbnb.com/rooms/42");
    }

    #[test]
    fn test_query_variants_collapse() {
        let a = canonicalize_url("https://www.airbnb.com/rooms/42?x=1").unwrap();
        let b = canonicalize_url("https://www.airbnb.com/rooms/42").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_path_is_kept_verbatim() {
        let url = canonicalize_url("https://www.airbnb.com/rooms/plus/42/").unwrap();
        assert_eq!(url.as_str(), "https://www.airbnb.com/rooms/plus/42/");
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        let url = canonicalize_url("  https://www.airbnb.com/rooms/42\n").unwrap();
        assert_eq!(url.as_str(), "https://www.airbnb.com/rooms/42");
    }

    #[test]
    fn test_reject_non_http_scheme() {
        assert!(matches!(
            canonicalize_url("ftp://example.com/file"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_reject_malformed() {
        assert!(matches!(
            canonicalize_url("not a url"),
            Err(UrlError::Parse(_))
        ));
    }

    #[test]
    fn test_resolve_root_relative_href() {
        let base = Url::parse("https://www.airbnb.com").unwrap();
        let url = resolve_href(&base, "/rooms/42?adults=2").unwrap();
        assert_eq!(url.as_str(), "https://www.airbnb.com/rooms/42?adults=2");
    }

    #[test]
    fn test_resolve_absolute_href() {
        let base = Url::parse("https://www.airbnb.com").unwrap();
        let url = resolve_href(&base, "https://www.airbnb.ca/rooms/7").unwrap();
        assert_eq!(url.as_str(), "https://www.airbnb.ca/rooms/7");
    }

    #[test]
    fn test_resolve_empty_href() {
        let base = Url::parse("https://www.airbnb.com").unwrap();
        assert!(resolve_href(&base, "   ").is_err());
    }
}
