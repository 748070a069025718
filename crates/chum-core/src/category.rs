//! Controlled vocabularies used by the extension metadata

use serde::{Deserialize, Serialize};
use std::fmt;

/// Application category, following the freedesktop menu specification
/// main categories plus the few the repository adds on top.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Accessibility,
    AudioVideo,
    Audio,
    Video,
    Development,
    Education,
    Game,
    Graphics,
    Library,
    Maps,
    Network,
    Office,
    Science,
    Settings,
    System,
    Utility,
    Other,
    /// A category outside the vocabulary, kept verbatim
    Unrecognized(String),
}

impl Category {
    /// Every category of the controlled vocabulary, in display order
    pub const KNOWN: [Category; 17] = [
        Category::Accessibility,
        Category::AudioVideo,
        Category::Audio,
        Category::Video,
        Category::Development,
        Category::Education,
        Category::Game,
        Category::Graphics,
        Category::Library,
        Category::Maps,
        Category::Network,
        Category::Office,
        Category::Science,
        Category::Settings,
        Category::System,
        Category::Utility,
        Category::Other,
    ];

    /// Resolves a category name against the vocabulary.
    /// Names outside it become [`Category::Unrecognized`].
    pub fn resolve(name: &str) -> Self {
        let name = name.trim();
        Self::KNOWN
            .iter()
            .find(|known| known.as_str() == name)
            .cloned()
            .unwrap_or_else(|| Category::Unrecognized(name.to_string()))
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Category::Unrecognized(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::Accessibility => "Accessibility",
            Category::AudioVideo => "AudioVideo",
            Category::Audio => "Audio",
            Category::Video => "Video",
            Category::Development => "Development",
            Category::Education => "Education",
            Category::Game => "Game",
            Category::Graphics => "Graphics",
            Category::Library => "Library",
            Category::Maps => "Maps",
            Category::Network => "Network",
            Category::Office => "Office",
            Category::Science => "Science",
            Category::Settings => "Settings",
            Category::System => "System",
            Category::Utility => "Utility",
            Category::Other => "Other",
            Category::Unrecognized(name) => name,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of software a package provides (AppStream component types)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppType {
    #[default]
    Generic,
    ConsoleApplication,
    DesktopApplication,
    Addon,
    Codec,
    Inputmethod,
    Firmware,
}

impl AppType {
    /// Parses the AppStream spelling (`desktop-application`, `addon`, ...)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "generic" => Some(AppType::Generic),
            "console-application" => Some(AppType::ConsoleApplication),
            "desktop-application" => Some(AppType::DesktopApplication),
            "addon" => Some(AppType::Addon),
            "codec" => Some(AppType::Codec),
            "inputmethod" => Some(AppType::Inputmethod),
            "firmware" => Some(AppType::Firmware),
            _ => None,
        }
    }
}
