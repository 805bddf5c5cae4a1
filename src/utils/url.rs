//! URL utilities for consistent endpoint construction.
//!
//! The gateway base URL is configured once and endpoints are appended to
//! it; normalizing both sides prevents double slashes in the final URLs.

/// Normalize a base URL by removing trailing slashes.
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Construct a complete endpoint URL from a base URL and an endpoint path.
///
/// # Examples
///
/// ```
/// use feathergate_client::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:8080/v1/", "chat/completions"),
///     "http://localhost:8080/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}
