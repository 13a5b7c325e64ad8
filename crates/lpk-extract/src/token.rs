//! Reference tokens inside model documents.
//!
//! A model document points at other archive entries in two ways: a field
//! whose whole value is an entry name, or a `*_Command` / `*_PostCommand`
//! field holding `;`-separated commands that mention entry names.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Command prefix that switches the model to another costume.
pub const COSTUME_SWITCH: &str = "change_cos";

/// A whole token naming an archive entry.
fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s;]*\.bin3?$").unwrap())
}

/// A leaf of a flattened document.
#[derive(Debug, Clone, PartialEq)]
pub struct Field<'a> {
    /// Object keys and array indices joined with `_`.
    pub name: String,
    pub value: &'a Value,
}

impl Field<'_> {
    /// Whether this field holds commands.
    pub fn is_command(&self) -> bool {
        is_command_field(&self.name)
    }

    /// The string value, if any.
    pub fn text(&self) -> Option<&str> {
        self.value.as_str()
    }
}

/// Flatten a document into its leaves, depth first, in document order.
pub fn flatten(document: &Value) -> Vec<Field<'_>> {
    let mut fields = Vec::new();
    flatten_into(document, String::new(), &mut fields);
    fields
}

fn flatten_into<'a>(value: &'a Value, prefix: String, out: &mut Vec<Field<'a>>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}_{key}")
        }
    };

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(child, join(key), out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(child, join(&index.to_string()), out);
            }
        }
        leaf => out.push(Field {
            name: prefix,
            value: leaf,
        }),
    }
}

/// Whether a field name denotes a command list.
pub fn is_command_field(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name.ends_with("_command") || name.ends_with("_postcommand")
}

/// Whether a field value is itself a reference to an archive entry.
pub fn is_reference(value: &str) -> bool {
    reference_pattern().is_match(value)
}

/// Find the first entry reference mentioned in a command.
///
/// Commands are whitespace-separated words; a word counts when it passes
/// [`is_reference`].
pub fn find_reference(command: &str) -> Option<&str> {
    command.split_whitespace().find(|word| is_reference(word))
}

/// Whether a command switches to another model.
pub fn is_costume_switch(command: &str) -> bool {
    command.trim_start().starts_with(COSTUME_SWITCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const REF: &str = "0123456789abcdef0123456789abcdef.bin";

    #[test]
    fn test_flatten_names_and_order() {
        let doc = json!({
            "Version": 3,
            "FileReferences": {
                "Moc": "a.bin",
                "Textures": ["b.bin", "c.bin"],
                "Motions": {"Idle": [{"File": "d.bin"}]}
            }
        });

        let names: Vec<_> = flatten(&doc).into_iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![
                "Version",
                "FileReferences_Moc",
                "FileReferences_Textures_0",
                "FileReferences_Textures_1",
                "FileReferences_Motions_Idle_0_File",
            ]
        );
    }

    #[test]
    fn test_command_fields() {
        assert!(is_command_field("Controllers_ParamHit_Items_0_PostCommand"));
        assert!(is_command_field("Items_0_Command"));
        assert!(!is_command_field("Command"));
        assert!(!is_command_field("Items_0_CommandList"));
    }

    #[test]
    fn test_value_references() {
        assert!(is_reference(REF));
        assert!(is_reference("0123456789abcdef0123456789abcdef.bin3"));
        assert!(!is_reference("texture.png"));
        assert!(!is_reference(&format!("change_cos {REF}")));
    }

    #[test]
    fn test_find_reference_in_command() {
        assert_eq!(find_reference(&format!("change_cos {REF}")), Some(REF));
        assert_eq!(find_reference(&format!("start_mtn {REF} 1")), Some(REF));
        assert_eq!(find_reference("parameters 1 2"), None);
        assert_eq!(find_reference("play_se voice.binary"), None);
    }

    #[test]
    fn test_value_and_command_agree() {
        for token in [REF, "0123456789abcdef0123456789abcdef.bin3", "model.bin", "Voice01.bin3"] {
            assert!(is_reference(token), "{token}");
            assert_eq!(find_reference(&format!("play_se {token}")), Some(token));
        }
        for token in ["texture.png", "x.bin.png", "x.binary"] {
            assert!(!is_reference(token), "{token}");
            assert_eq!(find_reference(&format!("play_se {token}")), None);
        }
    }

    #[test]
    fn test_costume_switch() {
        assert!(is_costume_switch(&format!(" change_cos {REF}")));
        assert!(!is_costume_switch(&format!("start_mtn {REF}")));
    }
}
