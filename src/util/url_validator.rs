use thiserror::Error;
use url::Url;

/// Reasons a record's link is not handed to the system browser.
#[derive(Error, Debug)]
pub enum LinkError {
    /// The link could not be parsed.
    #[error("Invalid link: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The link uses a scheme other than http or https.
    #[error("Unsupported link scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
}

/// Checks a feed-supplied link before it is passed to `open::that`.
///
/// Links are otherwise taken verbatim from the feed, so a `file://` or
/// `javascript:` value would be forwarded to the OS opener unchecked.
///
/// # Examples
///
/// ```
/// use meti_news::util::validate_link;
///
/// assert!(validate_link("https://www.meti.go.jp/press/a.html").is_ok());
/// assert!(validate_link("file:///etc/passwd").is_err());
/// ```
pub fn validate_link(link: &str) -> Result<Url, LinkError> {
    let url = Url::parse(link.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(LinkError::UnsupportedScheme(scheme.to_owned())),
    }
}
