use url::Url;

/// Returns true for the only schemes the crawler will ever fetch
pub fn is_http_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Checks whether two URLs share an origin (scheme, host and port)
///
/// Default ports are made explicit before comparing, so `https://a.com` and
/// `https://a.com:443` are the same origin while `http://a.com` is not.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use docharvest::url::same_origin;
///
/// let a = Url::parse("https://example.com/docs").unwrap();
/// let b = Url::parse("https://example.com:443/blog").unwrap();
/// let c = Url::parse("https://sub.example.com/docs").unwrap();
/// assert!(same_origin(&a, &b));
/// assert!(!same_origin(&a, &c));
/// ```
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Plain string prefix test on the URL path (not segment aware)
pub fn matches_prefix(url: &Url, prefix: Option<&str>) -> bool {
    prefix.map_or(true, |p| url.path().starts_with(p))
}
