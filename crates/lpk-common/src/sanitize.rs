//! Filesystem name sanitising.
//!
//! Character names and JSON field paths end up as directory and file names,
//! so anything a common filesystem rejects is replaced before use.

/// Characters rejected by at least one mainstream filesystem.
const ILLEGAL: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Device names Windows refuses as file or directory names.
const RESERVED: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Longest directory name we produce, in characters.
const MAX_DIR_NAME: usize = 120;

/// Turn a display name into a usable directory name.
///
/// Returns `None` when nothing usable is left, letting the caller fall back
/// to a generated name.
pub fn sanitize_dir_name(name: &str) -> Option<String> {
    let replaced: String = name
        .chars()
        .map(|c| if ILLEGAL.contains(&c) || c.is_control() { '_' } else { c })
        .take(MAX_DIR_NAME)
        .collect();

    let trimmed = replaced.trim().trim_end_matches(['.', ' ']);
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '_' || c == '.') {
        return None;
    }

    let upper = trimmed.to_ascii_uppercase();
    let device = upper.split('.').next().unwrap_or_default();
    if RESERVED.contains(&device) {
        return Some(format!("{trimmed}_"));
    }

    Some(trimmed.to_string())
}

/// Make a generated file stem safe to write and to embed in documents.
///
/// Filesystem-illegal characters, control characters, whitespace and `;` are
/// replaced with `_`. Whitespace and `;` would split the command strings the
/// stem is substituted into. Other Unicode is kept as-is.
pub fn sanitize_file_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| {
            if ILLEGAL.contains(&c) || c.is_control() || c.is_whitespace() || c == ';' {
                '_'
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illegal_characters_replaced() {
        assert_eq!(sanitize_dir_name("a/b:c?").as_deref(), Some("a_b_c_"));
        assert_eq!(sanitize_dir_name("  Hiyori  ").as_deref(), Some("Hiyori"));
        assert_eq!(sanitize_dir_name("name...").as_deref(), Some("name"));
    }

    #[test]
    fn test_unusable_names() {
        assert_eq!(sanitize_dir_name(""), None);
        assert_eq!(sanitize_dir_name("   "), None);
        assert_eq!(sanitize_dir_name("///"), None);
        assert_eq!(sanitize_dir_name(".."), None);
    }

    #[test]
    fn test_reserved_device_names() {
        assert_eq!(sanitize_dir_name("con").as_deref(), Some("con_"));
        assert_eq!(sanitize_dir_name("Console").as_deref(), Some("Console"));
    }

    #[test]
    fn test_unicode_names_kept() {
        assert_eq!(sanitize_dir_name("桃瀬ひより").as_deref(), Some("桃瀬ひより"));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(sanitize_file_stem("Motions_Idle_0_File_0"), "Motions_Idle_0_File_0");
        assert_eq!(sanitize_file_stem("a b\"c/ひ"), "a_b_c_ひ");
        assert_eq!(sanitize_file_stem("x;y\\z\t"), "x_y_z_");
    }

    #[test]
    fn test_file_stem_keeps_distinct_unicode_names() {
        let head = sanitize_file_stem("FileReferences_Motions_头_0_File_0");
        let body = sanitize_file_stem("FileReferences_Motions_体_0_File_0");
        assert_eq!(head, "FileReferences_Motions_头_0_File_0");
        assert_ne!(head, body);
    }
}
