//! Destination-folder identifier parsing from shared links.

use std::sync::OnceLock;

use regex::Regex;

use super::error::{DistributeError, Result};

/// A bare string shorter than this cannot plausibly be a folder id.
const MIN_BARE_ID_LENGTH: usize = 11;

/// Known link shapes, tried in order: path-segment folder links, query
/// parameter ids, direct `/d/` links.
fn link_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"/folders/([A-Za-z0-9_-]+)").expect("valid pattern"),
            Regex::new(r"[?&]id=([A-Za-z0-9_-]+)").expect("valid pattern"),
            Regex::new(r"/d/([A-Za-z0-9_-]+)").expect("valid pattern"),
        ]
    })
}

/// Parses the destination folder identifier out of a human-shared link.
///
/// Falls back to treating the trailing path segment (query stripped) as
/// the identifier when it is long enough to be plausible.
pub fn extract_folder_id(link: &str) -> Result<String> {
    for pattern in link_patterns() {
        if let Some(captures) = pattern.captures(link) {
            return Ok(captures[1].to_string());
        }
    }

    let bare = link.rsplit('/').next().unwrap_or(link);
    let bare = bare.split('?').next().unwrap_or(bare);
    if bare.len() >= MIN_BARE_ID_LENGTH {
        return Ok(bare.to_string());
    }

    Err(DistributeError::InvalidFolderLink(link.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_path_link() {
        assert_eq!(
            extract_folder_id("https://drive.example.com/drive/folders/ABCDEFG123").unwrap(),
            "ABCDEFG123"
        );
    }

    #[test]
    fn test_folder_path_link_with_query() {
        assert_eq!(
            extract_folder_id("https://drive.example.com/drive/folders/ABCDEFG123?usp=sharing")
                .unwrap(),
            "ABCDEFG123"
        );
    }

    #[test]
    fn test_query_id_link() {
        assert_eq!(
            extract_folder_id("https://drive.example.com/open?id=ABCDEFG123").unwrap(),
            "ABCDEFG123"
        );
    }

    #[test]
    fn test_direct_link() {
        assert_eq!(
            extract_folder_id("https://drive.example.com/d/ABCDEFG123/view").unwrap(),
            "ABCDEFG123"
        );
    }

    #[test]
    fn test_all_shapes_agree() {
        let shapes = [
            "https://drive.example.com/drive/folders/1AbCdEfGhIjKl",
            "https://drive.example.com/open?id=1AbCdEfGhIjKl",
            "1AbCdEfGhIjKl",
        ];
        for shape in shapes {
            assert_eq!(extract_folder_id(shape).unwrap(), "1AbCdEfGhIjKl");
        }
    }

    #[test]
    fn test_bare_id_with_query_suffix() {
        assert_eq!(
            extract_folder_id("1AbCdEfGhIjKl?usp=sharing").unwrap(),
            "1AbCdEfGhIjKl"
        );
    }

    #[test]
    fn test_short_bare_string_rejected() {
        let err = extract_folder_id("abc123").unwrap_err();
        assert!(matches!(err, DistributeError::InvalidFolderLink(_)));
    }

    #[test]
    fn test_empty_link_rejected() {
        assert!(extract_folder_id("").is_err());
    }
}
