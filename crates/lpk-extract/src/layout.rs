//! Canonical Live2D directory layout.
//!
//! Decides where a recovered file goes and what it is called. The same
//! [`classify`] result is used to write the file and to rewrite the
//! references pointing at it, so the two can never disagree.
//!
//! Rules are evaluated top to bottom and the first match wins:
//!
//! | # | Condition                                   | Directory         | Suffix          |
//! |---|---------------------------------------------|-------------------|-----------------|
//! | 1 | image extension                             | `textures`        |                 |
//! | 2 | `motion` + JSON, by `idle/tap|touch/flick/pinch` | `motions/<kind>` | `.motion3.json` |
//! | 3 | `expression`/`exp` + JSON                   | `expressions`     | `.exp3.json`    |
//! | 4 | `physics` + JSON                            | `physics`         | `.physics3.json`|
//! | 5 | `pose` + JSON                               | `pose`            | `.pose3.json`   |
//! | 6 | `effect` + JSON                             | `effects`         |                 |
//! | 7 | `userdata` + JSON                           | `userdata`        |                 |
//! | 8 | `.moc3`                                     | root              |                 |
//! | 9 | `*.model3.json`                             | root              |                 |
//! |10 | audio extension                             | `sounds`          |                 |
//! |11 | anything else                               | root              |                 |

use std::path::{Path, PathBuf};

/// Extensions placed under `textures/`.
pub const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".bmp", ".tga", ".gif", ".webp"];

/// Extensions placed under `sounds/`.
pub const AUDIO_EXTENSIONS: &[&str] = &[".wav", ".mp3", ".ogg", ".flac"];

/// Binary model data.
pub const MODEL_DATA_EXTENSION: &str = ".moc3";

/// Model descriptor file name suffix.
pub const MODEL_DESCRIPTOR_SUFFIX: &str = ".model3.json";

const JSON: &str = ".json";

/// Output category of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Textures,
    MotionsIdle,
    MotionsTap,
    MotionsFlick,
    MotionsPinch,
    MotionsDefault,
    Expressions,
    Physics,
    Pose,
    Effects,
    Userdata,
    Sounds,
    Root,
}

impl Category {
    /// Directory relative to the model root, empty for the root itself.
    pub fn dir(self) -> &'static str {
        match self {
            Category::Textures => "textures",
            Category::MotionsIdle => "motions/idle",
            Category::MotionsTap => "motions/tap",
            Category::MotionsFlick => "motions/flick",
            Category::MotionsPinch => "motions/pinch",
            Category::MotionsDefault => "motions",
            Category::Expressions => "expressions",
            Category::Physics => "physics",
            Category::Pose => "pose",
            Category::Effects => "effects",
            Category::Userdata => "userdata",
            Category::Sounds => "sounds",
            Category::Root => "",
        }
    }
}

/// Where a file ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub category: Category,
    /// Final file name, including the category suffix.
    pub file_name: String,
    /// `/`-separated path relative to the model root. This is the string
    /// written into rewritten documents.
    pub relative_path: String,
}

impl Placement {
    /// Physical location below `root`.
    pub fn output_path(&self, root: &Path) -> PathBuf {
        self.relative_path
            .split('/')
            .fold(root.to_path_buf(), |path, part| path.join(part))
    }
}

/// Lowercased view of the name being classified.
struct Candidate<'a> {
    name: &'a str,
    extension: &'a str,
}

impl Candidate<'_> {
    fn has(&self, needle: &str) -> bool {
        self.name.contains(needle)
    }

    fn is_json(&self) -> bool {
        self.extension == JSON
    }

    fn is_motion(&self) -> bool {
        self.is_json() && self.has("motion")
    }
}

struct Rule {
    category: Category,
    /// Replacement for the `.json` extension.
    suffix: Option<&'static str>,
    matches: fn(&Candidate<'_>) -> bool,
}

static RULES: &[Rule] = &[
    Rule {
        category: Category::Textures,
        suffix: None,
        matches: |p| IMAGE_EXTENSIONS.contains(&p.extension),
    },
    Rule {
        category: Category::MotionsIdle,
        suffix: Some(".motion3.json"),
        matches: |p| p.is_motion() && p.has("idle"),
    },
    Rule {
        category: Category::MotionsTap,
        suffix: Some(".motion3.json"),
        matches: |p| p.is_motion() && (p.has("tap") || p.has("touch")),
    },
    Rule {
        category: Category::MotionsFlick,
        suffix: Some(".motion3.json"),
        matches: |p| p.is_motion() && p.has("flick"),
    },
    Rule {
        category: Category::MotionsPinch,
        suffix: Some(".motion3.json"),
        matches: |p| p.is_motion() && p.has("pinch"),
    },
    Rule {
        category: Category::MotionsDefault,
        suffix: Some(".motion3.json"),
        matches: |p| p.is_motion(),
    },
    Rule {
        category: Category::Expressions,
        suffix: Some(".exp3.json"),
        matches: |p| p.is_json() && (p.has("expression") || p.has("exp")),
    },
    Rule {
        category: Category::Physics,
        suffix: Some(".physics3.json"),
        matches: |p| p.is_json() && p.has("physics"),
    },
    Rule {
        category: Category::Pose,
        suffix: Some(".pose3.json"),
        matches: |p| p.is_json() && p.has("pose"),
    },
    Rule {
        category: Category::Effects,
        suffix: None,
        matches: |p| p.is_json() && p.has("effect"),
    },
    Rule {
        category: Category::Userdata,
        suffix: None,
        matches: |p| p.is_json() && p.has("userdata"),
    },
    Rule {
        category: Category::Root,
        suffix: None,
        matches: |p| p.extension == MODEL_DATA_EXTENSION,
    },
    Rule {
        category: Category::Root,
        suffix: None,
        matches: |p| p.name.ends_with(MODEL_DESCRIPTOR_SUFFIX),
    },
    Rule {
        category: Category::Sounds,
        suffix: None,
        matches: |p| AUDIO_EXTENSIONS.contains(&p.extension),
    },
];

/// Classify a file given its stem and content extension (with leading dot).
pub fn classify(stem: &str, extension: &str) -> Placement {
    let full_name = format!("{stem}{extension}").to_lowercase();
    let extension = extension.to_lowercase();
    let candidate = Candidate {
        name: &full_name,
        extension: &extension,
    };

    let (category, suffix) = RULES
        .iter()
        .find(|rule| (rule.matches)(&candidate))
        .map_or((Category::Root, None), |rule| (rule.category, rule.suffix));

    let file_name = match suffix {
        Some(suffix) => format!("{stem}{suffix}"),
        None => format!("{stem}{extension}"),
    };

    let relative_path = match category.dir() {
        "" => file_name.clone(),
        dir => format!("{dir}/{file_name}"),
    };

    Placement {
        category,
        file_name,
        relative_path,
    }
}

/// Classify a complete file name, splitting off its last extension.
pub fn classify_file_name(file_name: &str) -> Placement {
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => classify(&file_name[..dot], &file_name[dot..]),
        _ => classify(file_name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_textures_win_over_names() {
        let p = classify("FileReferences_Motions_0", ".png");
        assert_eq!(p.category, Category::Textures);
        assert_eq!(p.relative_path, "textures/FileReferences_Motions_0.png");
    }

    #[test]
    fn test_motion_subcategories() {
        let cases = [
            ("FileReferences_Motions_Idle_0_File_0", Category::MotionsIdle, "motions/idle"),
            ("FileReferences_Motions_TapBody_0_File_0", Category::MotionsTap, "motions/tap"),
            ("Motions_Touch_0_File_0", Category::MotionsTap, "motions/tap"),
            ("Motions_Flick_0_File_0", Category::MotionsFlick, "motions/flick"),
            ("Motions_Pinch_0_File_0", Category::MotionsPinch, "motions/pinch"),
            ("Motions_Shake_0_File_0", Category::MotionsDefault, "motions"),
        ];

        for (stem, category, dir) in cases {
            let p = classify(stem, ".json");
            assert_eq!(p.category, category, "{stem}");
            assert_eq!(p.relative_path, format!("{dir}/{stem}.motion3.json"));
        }
    }

    #[test]
    fn test_motion_takes_precedence_over_expression() {
        // "expression" also matches, but motions are checked first
        let p = classify("Motions_Expression_0", ".json");
        assert_eq!(p.category, Category::MotionsDefault);
    }

    #[test]
    fn test_json_categories() {
        assert_eq!(
            classify("FileReferences_Expressions_0_File_0", ".json").relative_path,
            "expressions/FileReferences_Expressions_0_File_0.exp3.json"
        );
        assert_eq!(
            classify("FileReferences_Physics_0", ".json").relative_path,
            "physics/FileReferences_Physics_0.physics3.json"
        );
        assert_eq!(
            classify("FileReferences_Pose_0", ".json").relative_path,
            "pose/FileReferences_Pose_0.pose3.json"
        );
        assert_eq!(classify("Effect_0", ".json").relative_path, "effects/Effect_0.json");
        assert_eq!(
            classify("FileReferences_UserData_0", ".json").relative_path,
            "userdata/FileReferences_UserData_0.json"
        );
    }

    #[test]
    fn test_name_rules_need_json_content() {
        let p = classify("FileReferences_Physics_0", ".bin");
        assert_eq!(p.category, Category::Root);
        assert_eq!(p.relative_path, "FileReferences_Physics_0.bin");
    }

    #[test]
    fn test_root_files() {
        assert_eq!(classify("FileReferences_Moc_0", ".moc3").relative_path, "FileReferences_Moc_0.moc3");
        let descriptor = classify_file_name("model0.model3.json");
        assert_eq!(descriptor.category, Category::Root);
        assert_eq!(descriptor.relative_path, "model0.model3.json");
    }

    #[test]
    fn test_sounds() {
        let p = classify("Motions_Idle_0_Sound_0", ".wav");
        assert_eq!(p.category, Category::Sounds);
        assert_eq!(p.relative_path, "sounds/Motions_Idle_0_Sound_0.wav");
    }

    #[test]
    fn test_default_keeps_name() {
        let p = classify("Controllers_Command_0", ".bin");
        assert_eq!(p.category, Category::Root);
        assert_eq!(p.file_name, "Controllers_Command_0.bin");
    }

    #[test]
    fn test_output_path_matches_relative_path() {
        let root = Path::new("out").join("Hiyori");
        for (stem, ext) in [
            ("Motions_Idle_0_File_0", ".json"),
            ("Textures_0", ".png"),
            ("Moc_0", ".moc3"),
            ("Sound_0", ".ogg"),
        ] {
            let p = classify(stem, ext);
            let written = p.output_path(&root);
            let relative = written.strip_prefix(&root).unwrap();
            let rebuilt: Vec<_> = relative.iter().map(|c| c.to_str().unwrap()).collect();
            assert_eq!(rebuilt.join("/"), p.relative_path);
        }
    }
}
