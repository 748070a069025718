//! Extension metadata embedded in package descriptions
//!
//! Packagers append a YAML mapping as the last paragraph of the RPM
//! description:
//!
//! ```yaml
//! PackageName: Foo Reader
//! Type: desktop-application
//! Categories:
//!   - Office
//! Custom:
//!   Repo: https://github.com/example/foo
//! Links:
//!   Bugtracker: https://github.com/example/foo/issues
//! ```
//!
//! Parsing is tolerant: unknown keys are ignored and malformed values are
//! reported as [`MetadataError`]s next to whatever could be read.

use chum_core::{AppType, Category, MetadataError};
use serde_yaml_ng::{Mapping, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Values read from an extension block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionMetadata {
    /// `Title`, falling back to `PackageName`
    pub title: Option<String>,
    pub app_type: Option<AppType>,
    pub icon: Option<String>,
    pub screenshots: Vec<String>,
    pub developer_name: Option<String>,
    pub packager_name: Option<String>,
    pub repo_url: Option<String>,
    pub packaging_repo_url: Option<String>,
    pub markdown_url: Option<String>,
    /// Lowercased label → URL
    pub links: BTreeMap<String, String>,
    /// `None` when the block has no (usable) `Categories`
    pub categories: Option<BTreeSet<Category>>,
}

/// A parse that always yields a value, plus the problems met on the way
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parsed<T> {
    pub value: T,
    pub errors: Vec<MetadataError>,
}

/// Scalars are accepted as text whatever their YAML type (`Title: 2048`)
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn get<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|value| !value.is_null())
}

struct Reader<'a> {
    map: &'a Mapping,
    errors: Vec<MetadataError>,
}

impl<'a> Reader<'a> {
    fn shape(&mut self, field: &str, expected: &str) {
        self.errors.push(MetadataError::UnexpectedShape {
            field: field.to_string(),
            expected: expected.to_string(),
        });
    }

    fn text(&mut self, key: &str) -> Option<String> {
        let value = get(self.map, key)?;
        match as_text(value) {
            Some(text) if !text.is_empty() => Some(text),
            Some(_) => None,
            None => {
                self.shape(key, "a text value");
                None
            }
        }
    }

    fn text_list(&mut self, key: &str) -> Option<Vec<String>> {
        let value = get(self.map, key)?;
        let Value::Sequence(items) = value else {
            self.shape(key, "a list");
            return None;
        };

        let mut result = Vec::new();
        for item in items {
            match as_text(item) {
                Some(text) if !text.is_empty() => result.push(text),
                Some(_) => {}
                None => self.shape(key, "a list of text values"),
            }
        }
        Some(result)
    }

    /// `Custom` as a mapping, or as a list of mappings merged in order
    fn custom(&mut self) -> Option<Mapping> {
        match get(self.map, "Custom")? {
            Value::Mapping(map) => Some(map.clone()),
            Value::Sequence(items) => {
                let mut merged = Mapping::new();
                for item in items {
                    match item {
                        Value::Mapping(map) => {
                            for (k, v) in map {
                                merged.insert(k.clone(), v.clone());
                            }
                        }
                        _ => self.shape("Custom", "a mapping or a list of mappings"),
                    }
                }
                Some(merged)
            }
            _ => {
                self.shape("Custom", "a mapping or a list of mappings");
                None
            }
        }
    }

    fn links(&mut self) -> BTreeMap<String, String> {
        let (key, value) = match (get(self.map, "Links"), get(self.map, "Url")) {
            (Some(value), _) => ("Links", value),
            (None, Some(value)) => ("Url", value),
            (None, None) => return BTreeMap::new(),
        };

        let Value::Mapping(map) = value else {
            self.shape(key, "a mapping of labels to URLs");
            return BTreeMap::new();
        };

        let mut links = BTreeMap::new();
        for (label, url) in map {
            match (as_text(label), as_text(url)) {
                (Some(label), Some(url)) => {
                    links.insert(label.to_lowercase(), url);
                }
                _ => self.shape(key, "a mapping of labels to URLs"),
            }
        }
        links
    }

    fn categories(&mut self) -> Option<BTreeSet<Category>> {
        let names = self.text_list("Categories")?;
        let mut categories = BTreeSet::new();
        for name in names {
            let category = Category::resolve(&name);
            if !category.is_recognized() {
                self.errors.push(MetadataError::UnrecognizedCategory(name));
            }
            categories.insert(category);
        }
        Some(categories)
    }

    fn app_type(&mut self) -> Option<AppType> {
        let value = self.text("Type")?;
        match AppType::parse(&value) {
            Some(app_type) => Some(app_type),
            None => {
                self.errors.push(MetadataError::UnknownAppType(value));
                None
            }
        }
    }
}

/// Parses an extension block.
///
/// Returns `Ok(None)` when the block is valid YAML but not a mapping; it is
/// then ordinary description text.
pub fn parse_extension(
    block: &str,
) -> Result<Option<Parsed<ExtensionMetadata>>, serde_yaml_ng::Error> {
    let value: Value = serde_yaml_ng::from_str(block)?;
    let Value::Mapping(map) = value else {
        return Ok(None);
    };

    let mut reader = Reader {
        map: &map,
        errors: Vec::new(),
    };

    let title = reader.text("Title").or_else(|| reader.text("PackageName"));
    let icon = reader.text("PackageIcon").or_else(|| reader.text("Icon"));
    let app_type = reader.app_type();
    let screenshots = reader.text_list("Screenshots").unwrap_or_default();
    let developer_name = reader.text("DeveloperName");
    let packager_name = reader.text("PackagedBy");

    let (repo_url, packaging_repo_url, markdown_url) = match reader.custom() {
        Some(custom) => {
            let mut custom_reader = Reader {
                map: &custom,
                errors: Vec::new(),
            };
            let fields = (
                custom_reader.text("Repo"),
                custom_reader.text("PackagingRepo"),
                custom_reader.text("DescriptionMD"),
            );
            reader.errors.append(&mut custom_reader.errors);
            fields
        }
        None => (None, None, None),
    };

    let links = reader.links();
    let categories = reader.categories();

    Ok(Some(Parsed {
        value: ExtensionMetadata {
            title,
            app_type,
            icon,
            screenshots,
            developer_name,
            packager_name,
            repo_url,
            packaging_repo_url,
            markdown_url,
            links,
            categories,
        },
        errors: reader.errors,
    }))
}

/// Derives a display title from a package name.
///
/// `harbour-foo-bar` → `Foo Bar`, `libfoo` → `Foo (library)`,
/// `foo-devel` → `Foo (development files)`.
pub fn name_to_title(name: &str) -> String {
    let mut parts: Vec<String> = name.split('-').map(str::to_string).collect();

    if parts.len() > 1 && matches!(parts[0].as_str(), "harbour" | "openrepos") {
        parts.remove(0);
    }
    if let Some(rest) = parts[0].strip_prefix("lib") {
        parts[0] = rest.to_string();
        parts.push("(library)".to_string());
    }
    if let Some(last) = parts.last_mut() {
        if last == "devel" {
            *last = "(development files)".to_string();
        }
    }

    parts
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| capitalize(part))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Uppercases the first character and lowercases the rest
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_to_title() {
        assert_eq!(name_to_title("harbour-foo-bar"), "Foo Bar");
        assert_eq!(name_to_title("openrepos-thing"), "Thing");
        assert_eq!(name_to_title("libfoo"), "Foo (library)");
        assert_eq!(name_to_title("foo-devel"), "Foo (development files)");
        assert_eq!(name_to_title("libfoo-devel"), "Foo Devel (library)");
        assert_eq!(name_to_title("QtFoo"), "Qtfoo");
        assert_eq!(name_to_title("harbour"), "Harbour");
    }

    #[test]
    fn test_plain_text_is_not_metadata() {
        assert!(parse_extension("Just a sentence about the app.").unwrap().is_none());
        assert!(parse_extension("- a\n- list").unwrap().is_none());
        assert!(parse_extension("key: [unclosed").is_err());
    }

    #[test]
    fn test_full_block() {
        let block = "\
Title: Foo Reader
Type: desktop-application
PackageIcon: https://example.org/icon.png
Screenshots:
  - https://example.org/1.png
  - https://example.org/2.png
DeveloperName: Jane
PackagedBy: Joe
Categories:
  - Office
  - Utility
Custom:
  Repo: https://github.com/example/foo
  DescriptionMD: https://example.org/README.md
Links:
  Bugtracker: https://github.com/example/foo/issues
";
        let parsed = parse_extension(block).unwrap().unwrap();
        assert!(parsed.errors.is_empty());

        let meta = parsed.value;
        assert_eq!(meta.title.as_deref(), Some("Foo Reader"));
        assert_eq!(meta.app_type, Some(AppType::DesktopApplication));
        assert_eq!(meta.screenshots.len(), 2);
        assert_eq!(meta.repo_url.as_deref(), Some("https://github.com/example/foo"));
        assert_eq!(meta.markdown_url.as_deref(), Some("https://example.org/README.md"));
        assert_eq!(
            meta.links.get("bugtracker").map(String::as_str),
            Some("https://github.com/example/foo/issues")
        );
        assert_eq!(
            meta.categories,
            Some(BTreeSet::from([Category::Office, Category::Utility]))
        );
    }

    #[test]
    fn test_custom_as_list_of_mappings() {
        let block = "Custom:\n  - Repo: https://a\n  - PackagingRepo: https://b\n";
        let meta = parse_extension(block).unwrap().unwrap().value;
        assert_eq!(meta.repo_url.as_deref(), Some("https://a"));
        assert_eq!(meta.packaging_repo_url.as_deref(), Some("https://b"));
    }

    #[test]
    fn test_malformed_fields_are_reported() {
        let block = "Title: Foo\nLinks: not-a-map\nCategories:\n  - Chat\n  - Game\nType: spaceship\n";
        let parsed = parse_extension(block).unwrap().unwrap();
        assert_eq!(parsed.value.title.as_deref(), Some("Foo"));
        assert!(parsed.value.links.is_empty());
        assert_eq!(
            parsed.value.categories,
            Some(BTreeSet::from([
                Category::Game,
                Category::Unrecognized("Chat".to_string())
            ]))
        );
        assert!(parsed
            .errors
            .contains(&MetadataError::UnrecognizedCategory("Chat".to_string())));
        assert!(parsed
            .errors
            .contains(&MetadataError::UnknownAppType("spaceship".to_string())));
        assert!(parsed
            .errors
            .iter()
            .any(|e| matches!(e, MetadataError::UnexpectedShape { field, .. } if field == "Links")));
    }

    #[test]
    fn test_url_is_links_fallback() {
        let meta = parse_extension("PackageName: Foo\nUrl:\n  Homepage: https://x\n")
            .unwrap()
            .unwrap()
            .value;
        assert_eq!(meta.title.as_deref(), Some("Foo"));
        assert_eq!(meta.links.get("homepage").map(String::as_str), Some("https://x"));
    }
}
