//! URL helpers for consistent endpoint construction
//!
//! Normalizing the base URL prevents double slashes when endpoints are
//! appended.

/// Normalize a base URL by removing trailing slashes.
///
/// # Examples
///
/// ```
/// use causerie::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.replicate.com/v1"), "https://api.replicate.com/v1");
/// assert_eq!(normalize_base_url("https://api.replicate.com/v1/"), "https://api.replicate.com/v1");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Construct a complete endpoint URL from a base URL and a path.
///
/// # Examples
///
/// ```
/// use causerie::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.replicate.com/v1/", "predictions"),
///     "https://api.replicate.com/v1/predictions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://api.replicate.com/v1"),
            "https://api.replicate.com/v1"
        );
        assert_eq!(
            normalize_base_url("https://api.replicate.com/v1///"),
            "https://api.replicate.com/v1"
        );
    }

    #[test]
    fn test_construct_api_url() {
        assert_eq!(
            construct_api_url("https://api.replicate.com/v1", "predictions"),
            "https://api.replicate.com/v1/predictions"
        );
        assert_eq!(
            construct_api_url("https://api.replicate.com/v1/", "/predictions"),
            "https://api.replicate.com/v1/predictions"
        );
    }
}
