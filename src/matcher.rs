//! Extension-style URL match patterns
//!
//! Patterns take the form `scheme://host/path` with `*` wildcards, plus the
//! special `<all_urls>` token. Evaluation happens on every navigation for
//! every loaded extension, so matching is deterministic and
//! side-effect-free.

use lazy_static::lazy_static;
use regex::Regex;

const ALL_URLS: &str = "<all_urls>";
const SUPPORTED_SCHEMES: [&str; 5] = ["*", "http", "https", "ftp", "file"];

lazy_static! {
    /// scheme :// host (up to the first `/`, `?` or `#`) rest-up-to-fragment
    static ref URL_PARTS: Regex =
        Regex::new(r"^([a-zA-Z][a-zA-Z0-9+.\-]*)://([^/?#]*)([^#]*)").unwrap();
}

/// Returns true when `url` matches at least one of `patterns`.
///
/// Unparseable patterns are skipped silently: extensions routinely declare
/// patterns outside the supported subset, and a bad entry must not disable
/// its neighbors. An empty pattern list never matches.
pub fn matches(url: &str, patterns: &[String]) -> bool {
    let parts = split_url(url);

    patterns.iter().any(|p| {
        if p == ALL_URLS {
            return true;
        }
        match &parts {
            Some(parts) => pattern_matches(parts, p),
            None => false,
        }
    })
}

#[derive(Debug, PartialEq)]
struct UrlParts {
    scheme: String,
    host: String,
    path_and_query: String,
}

fn split_url(url: &str) -> Option<UrlParts> {
    let caps = URL_PARTS.captures(url)?;

    let scheme = caps[1].to_lowercase();
    let mut host = caps[2].to_lowercase();

    // Ports never participate in matching
    if let Some(colon) = host.rfind(':') {
        if host[colon + 1..].chars().all(|c| c.is_ascii_digit()) {
            host.truncate(colon);
        }
    }

    // Matching is anchored against path + query, with a "/" floor so that
    // "https://example.com" and "https://example.com/" are equivalent
    let rest = &caps[3];
    let path_and_query = if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{}", rest)
    };

    Some(UrlParts {
        scheme,
        host,
        path_and_query,
    })
}

fn pattern_matches(url: &UrlParts, pattern: &str) -> bool {
    if pattern == ALL_URLS {
        return true;
    }

    let (scheme, rest) = match pattern.split_once("://") {
        Some(parts) => parts,
        None => return false,
    };
    if !SUPPORTED_SCHEMES.contains(&scheme) {
        return false;
    }

    let (host, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => return false,
    };

    scheme_matches(&url.scheme, scheme)
        && host_matches(&url.host, host)
        && path_matches(&url.path_and_query, path)
}

fn scheme_matches(url_scheme: &str, pattern_scheme: &str) -> bool {
    pattern_scheme == "*" || url_scheme == pattern_scheme
}

fn host_matches(url_host: &str, pattern_host: &str) -> bool {
    if pattern_host == "*" {
        return true;
    }
    if let Some(domain) = pattern_host.strip_prefix("*.") {
        let domain = domain.to_lowercase();
        return url_host == domain || url_host.ends_with(&format!(".{}", domain));
    }
    url_host == pattern_host.to_lowercase()
}

fn path_matches(url_path: &str, pattern_path: &str) -> bool {
    let expression = format!("^{}$", regex::escape(pattern_path).replace(r"\*", ".*"));
    match Regex::new(&expression) {
        Ok(re) => re.is_match(url_path),
        Err(_) => false,
    }
}
