//! Helpers for sanitizing data before it enters logs or span attributes.
//!
//! Logs are safe to share for debugging — these functions ensure no
//! sensitive data (bearer tokens, URL userinfo, remote error payloads)
//! leaks into them.

/// Maximum length for logged remote error bodies.
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Truncates a remote error body to a loggable length.
///
/// Remote services occasionally echo request material back in error
/// payloads; keeping only a prefix preserves the useful context.
pub fn truncate_error_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", &body[..end])
}

/// Strips userinfo from a URL before logging it.
///
/// - `https://token@files.example.com/a.zip` → `https://****@files.example.com/a.zip`
/// - `https://files.example.com/a.zip` → unchanged
pub fn redact_url(url: &str) -> String {
    if let Some(scheme_end) = url.find("://") {
        let after_scheme = &url[scheme_end + 3..];
        // Userinfo can only appear before the first path separator.
        let authority_end = after_scheme.find('/').unwrap_or(after_scheme.len());
        if let Some(at_pos) = after_scheme[..authority_end].find('@') {
            let scheme = &url[..scheme_end + 3];
            let after_at = &after_scheme[at_pos + 1..];
            return format!("{}****@{}", scheme, after_at);
        }
    }

    url.to_string()
}
