use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

pub const RESEARCH_PAPERS: &str = "Research Papers";
pub const INSTRUCTIONS: &str = "Instructions";
pub const SPREADSHEETS: &str = "Spreadsheets";
pub const IMAGES: &str = "Images";
pub const ARCHIVES: &str = "Archives";

/// Fallback bucket. Always available and never part of a registry.
pub const OTHERS: &str = "Others";

/// Categories whose membership is decided by content sampling.
pub const CONTENT_SNIFFED: &[&str] = &[RESEARCH_PAPERS, INSTRUCTIONS];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("unknown category '{name}' (known: {known})")]
    Unknown { name: String, known: String },
    #[error("category '{0}' has no extensions")]
    NoExtensions(String),
    #[error("category '{0}' is defined twice")]
    Duplicate(String),
    #[error("'Others' is the fallback category and cannot be registered")]
    Reserved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    name: String,
    extensions: Vec<String>,
}

impl Category {
    pub fn new<I, S>(name: impl Into<String>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            extensions: extensions
                .into_iter()
                .map(|e| normalize_extension(e.as_ref()))
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn matches_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e == ext)
    }

    pub fn is_content_sniffed(&self) -> bool {
        CONTENT_SNIFFED.contains(&self.name.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.extensions.join(", "))
    }
}

/// Lowercase with a leading dot: "PDF", ".Pdf" and "pdf" all become ".pdf".
pub fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(".{}", trimmed.to_lowercase())
    }
}

/// Ordered set of categories. Lookup order is registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl CategoryRegistry {
    pub fn new(categories: Vec<Category>) -> Result<Self, CategoryError> {
        let mut seen = BTreeSet::new();
        for category in &categories {
            if category.name.eq_ignore_ascii_case(OTHERS) {
                return Err(CategoryError::Reserved);
            }
            if !seen.insert(category.name.to_lowercase()) {
                return Err(CategoryError::Duplicate(category.name.clone()));
            }
            if category.extensions.is_empty() && !category.is_content_sniffed() {
                return Err(CategoryError::NoExtensions(category.name.clone()));
            }
        }
        Ok(Self { categories })
    }

    pub fn builtin() -> Self {
        Self {
            categories: vec![
                Category::new(RESEARCH_PAPERS, [".pdf"]),
                Category::new(INSTRUCTIONS, [".docx", ".txt"]),
                Category::new(SPREADSHEETS, [".xlsx", ".csv"]),
                Category::new(IMAGES, [".png", ".jpg", ".jpeg", ".gif"]),
                Category::new(ARCHIVES, [".zip", ".rar", ".tar", ".gz"]),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Case-insensitive lookup by name.
    pub fn find(&self, name: &str) -> Option<&Category> {
        let name = name.trim();
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// First enabled category, in registry order, listing `ext`.
    pub fn match_extension(&self, ext: &str, enabled: &EnabledCategories) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.matches_extension(ext) && enabled.contains(c.name()))
    }

    fn unknown(&self, name: &str) -> CategoryError {
        CategoryError::Unknown {
            name: name.to_string(),
            known: self.names().collect::<Vec<_>>().join(", "),
        }
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Category names currently switched on by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledCategories(BTreeSet<String>);

impl EnabledCategories {
    pub fn all(registry: &CategoryRegistry) -> Self {
        Self(registry.names().map(String::from).collect())
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// Builds a set from caller-supplied names, resolving them to the
    /// registry's canonical spelling.
    pub fn from_names<I, S>(registry: &CategoryRegistry, names: I) -> Result<Self, CategoryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|n| {
                registry
                    .find(n.as_ref())
                    .map(|c| c.name().to_string())
                    .ok_or_else(|| registry.unknown(n.as_ref()))
            })
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    pub fn disable(
        mut self,
        registry: &CategoryRegistry,
        name: &str,
    ) -> Result<Self, CategoryError> {
        let category = registry.find(name).ok_or_else(|| registry.unknown(name))?;
        self.0.remove(category.name());
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_extension_variants() {
        assert_eq!(normalize_extension("PDF"), ".pdf");
        assert_eq!(normalize_extension(".Pdf"), ".pdf");
        assert_eq!(normalize_extension("  .gz "), ".gz");
        assert_eq!(normalize_extension(""), "");
        assert_eq!(normalize_extension("."), "");
    }

    #[test]
    fn builtin_registry_order() {
        let registry = CategoryRegistry::builtin();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(
            names,
            vec![RESEARCH_PAPERS, INSTRUCTIONS, SPREADSHEETS, IMAGES, ARCHIVES]
        );
        assert!(registry.find(OTHERS).is_none());
    }

    #[test]
    fn find_is_case_insensitive() {
        let registry = CategoryRegistry::builtin();
        assert_eq!(registry.find("images").map(|c| c.name()), Some(IMAGES));
        assert_eq!(
            registry.find(" research papers ").map(|c| c.name()),
            Some(RESEARCH_PAPERS)
        );
        assert!(registry.find("videos").is_none());
    }

    #[test]
    fn match_extension_respects_enabled_set() {
        let registry = CategoryRegistry::builtin();
        let all = EnabledCategories::all(&registry);
        assert_eq!(
            registry.match_extension(".png", &all).map(|c| c.name()),
            Some(IMAGES)
        );

        let without_images = all.disable(&registry, "Images").unwrap();
        assert!(registry.match_extension(".png", &without_images).is_none());
    }

    #[test]
    fn first_registered_category_wins() {
        let registry = CategoryRegistry::new(vec![
            Category::new("Photos", ["png"]),
            Category::new("Images", ["png", "jpg"]),
        ])
        .unwrap();
        let enabled = EnabledCategories::all(&registry);

        assert_eq!(
            registry.match_extension(".png", &enabled).map(|c| c.name()),
            Some("Photos")
        );

        let enabled = enabled.disable(&registry, "photos").unwrap();
        assert_eq!(
            registry.match_extension(".png", &enabled).map(|c| c.name()),
            Some("Images")
        );
    }

    #[test]
    fn registry_rejects_invalid_definitions() {
        assert_eq!(
            CategoryRegistry::new(vec![Category::new("Videos", Vec::<&str>::new())]),
            Err(CategoryError::NoExtensions("Videos".to_string()))
        );
        assert_eq!(
            CategoryRegistry::new(vec![
                Category::new("Images", ["png"]),
                Category::new("images", ["gif"]),
            ]),
            Err(CategoryError::Duplicate("images".to_string()))
        );
        assert_eq!(
            CategoryRegistry::new(vec![Category::new("Others", ["bin"])]),
            Err(CategoryError::Reserved)
        );
        assert!(CategoryRegistry::new(vec![Category::new(
            INSTRUCTIONS,
            Vec::<&str>::new()
        )])
        .is_ok());
    }

    #[test]
    fn enabled_from_names_canonicalizes() {
        let registry = CategoryRegistry::builtin();
        let enabled = EnabledCategories::from_names(&registry, ["images", "ARCHIVES"]).unwrap();

        assert!(enabled.contains(IMAGES));
        assert!(enabled.contains(ARCHIVES));
        assert_eq!(enabled.len(), 2);
    }

    #[test]
    fn enabled_from_names_rejects_unknown() {
        let registry = CategoryRegistry::builtin();
        let err = EnabledCategories::from_names(&registry, ["Images", "Videos"]).unwrap_err();

        assert!(matches!(err, CategoryError::Unknown { ref name, .. } if name == "Videos"));
        assert!(err.to_string().contains("Spreadsheets"));
    }

    #[test]
    fn others_is_not_togglable() {
        let registry = CategoryRegistry::builtin();
        assert!(EnabledCategories::from_names(&registry, [OTHERS]).is_err());
    }
}
