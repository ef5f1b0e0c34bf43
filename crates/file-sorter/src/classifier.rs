use file_sorter_core::{CategoryRegistry, EnabledCategories, INSTRUCTIONS, OTHERS, RESEARCH_PAPERS};
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::types::FileEntry;

pub const RESEARCH_KEYWORDS: &[&str] = &["abstract", "introduction", "methodology", "references"];
pub const INSTRUCTION_KEYWORDS: &[&str] = &["step", "instruction", "guide", "how to"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: String,
    pub basis: Basis,
}

/// Why a file landed in its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Basis {
    Keyword(String),
    NoKeyword,
    InspectionFailed(String),
    Extension,
    Unmatched,
}

impl Classification {
    fn new(category: impl Into<String>, basis: Basis) -> Self {
        Self {
            category: category.into(),
            basis,
        }
    }

    fn others(basis: Basis) -> Self {
        Self::new(OTHERS, basis)
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(k) => write!(f, "content mentions \"{}\"", k),
            Self::NoKeyword => f.write_str("no content markers found"),
            Self::InspectionFailed(e) => write!(f, "content unreadable ({})", e),
            Self::Extension => f.write_str("extension"),
            Self::Unmatched => f.write_str("no enabled category for extension"),
        }
    }
}

pub trait Classifier {
    fn classify(&self, file: &FileEntry, enabled: &EnabledCategories) -> Classification;
}

/// Content rules first (PDF research markers, then document instruction
/// markers), then extension lookup in registry order, then the fallback.
pub struct RuleBasedClassifier<'a> {
    registry: &'a CategoryRegistry,
}

impl<'a> RuleBasedClassifier<'a> {
    pub fn new(registry: &'a CategoryRegistry) -> Self {
        Self { registry }
    }

    fn sniff(&self, file: &FileEntry, category: &str, keywords: &[&str]) -> Classification {
        match file.sample() {
            Some(Ok(sample)) => sample
                .first_match(keywords)
                .map(|k| Classification::new(category, Basis::Keyword(k.to_string())))
                .unwrap_or_else(|| Classification::others(Basis::NoKeyword)),
            Some(Err(e)) => {
                debug!(file = file.name(), error = %e, "content inspection failed");
                Classification::others(Basis::InspectionFailed(e.to_string()))
            }
            None => Classification::others(Basis::Unmatched),
        }
    }
}

impl Classifier for RuleBasedClassifier<'_> {
    fn classify(&self, file: &FileEntry, enabled: &EnabledCategories) -> Classification {
        let ext = file.extension();

        let classification = if ext == ".pdf" && enabled.contains(RESEARCH_PAPERS) {
            self.sniff(file, RESEARCH_PAPERS, RESEARCH_KEYWORDS)
        } else if matches!(ext, ".docx" | ".txt") && enabled.contains(INSTRUCTIONS) {
            self.sniff(file, INSTRUCTIONS, INSTRUCTION_KEYWORDS)
        } else {
            self.registry
                .match_extension(ext, enabled)
                .map(|c| Classification::new(c.name(), Basis::Extension))
                .unwrap_or_else(|| Classification::others(Basis::Unmatched))
        };

        debug!(
            file = file.name(),
            category = %classification.category,
            basis = %classification.basis,
            "classified"
        );
        classification
    }
}

pub fn classify_file(
    path: &Path,
    registry: &CategoryRegistry,
    enabled: &EnabledCategories,
) -> Classification {
    RuleBasedClassifier::new(registry).classify(&FileEntry::new(path), enabled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use file_sorter_core::testutils::{write_docx, write_docx_body, write_pdf};
    use file_sorter_core::{Category, ARCHIVES, IMAGES, SPREADSHEETS};
    use std::fs;
    use tempfile::TempDir;

    fn all_enabled() -> (CategoryRegistry, EnabledCategories) {
        let registry = CategoryRegistry::builtin();
        let enabled = EnabledCategories::all(&registry);
        (registry, enabled)
    }

    fn classify_in(dir: &TempDir, name: &str, content: &[u8]) -> Classification {
        let (registry, enabled) = all_enabled();
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        classify_file(&path, &registry, &enabled)
    }

    #[test]
    fn extension_mapping_ignores_content() {
        let dir = TempDir::new().unwrap();

        for (name, expected) in [
            ("photo.png", IMAGES),
            ("scan.JPEG", IMAGES),
            ("data.xlsx", SPREADSHEETS),
            ("table.csv", SPREADSHEETS),
            ("backup.tar.gz", ARCHIVES),
            ("bundle.rar", ARCHIVES),
        ] {
            let result = classify_in(&dir, name, b"abstract step guide");
            assert_eq!(result.category, expected, "{}", name);
            assert_eq!(result.basis, Basis::Extension);
        }
    }

    #[test]
    fn unknown_extension_goes_to_others() {
        let dir = TempDir::new().unwrap();
        let result = classify_in(&dir, "unknown.xyz", b"");
        assert_eq!(result.category, OTHERS);
        assert_eq!(result.basis, Basis::Unmatched);

        let result = classify_in(&dir, "Makefile", b"all:");
        assert_eq!(result.category, OTHERS);
    }

    #[test]
    fn disabled_category_falls_through_to_others() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        fs::write(&path, b"png").unwrap();

        let (registry, enabled) = all_enabled();
        let enabled = enabled.disable(&registry, IMAGES).unwrap();

        assert_eq!(classify_file(&path, &registry, &enabled).category, OTHERS);
    }

    #[test]
    fn docx_opening_with_a_table_reads_body_paragraphs() {
        let dir = TempDir::new().unwrap();
        let cells: String = (0..12)
            .map(|i| format!("<w:tc><w:p><w:r><w:t>part {}</w:t></w:r></w:p></w:tc>", i))
            .collect();
        let body = format!(
            "<w:tbl><w:tr>{}</w:tr></w:tbl><w:p><w:r><w:t>Assembly guide</w:t></w:r></w:p>",
            cells
        );
        let path = write_docx_body(dir.path(), "shelf.docx", &body).unwrap();
        let (registry, enabled) = all_enabled();

        let result = classify_file(&path, &registry, &enabled);

        assert_eq!(result.category, INSTRUCTIONS);
        assert_eq!(result.basis, Basis::Keyword("guide".to_string()));
    }

    #[test]
    fn text_with_instruction_marker() {
        let dir = TempDir::new().unwrap();
        let result = classify_in(&dir, "notes.txt", b"Step 1: begin\n");

        assert_eq!(result.category, INSTRUCTIONS);
        assert_eq!(result.basis, Basis::Keyword("step".to_string()));
    }

    #[test]
    fn text_marker_past_tenth_line_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut content: String = (0..10).map(|_| "lorem ipsum\n").collect();
        content.push_str("How to assemble the shelf\n");

        let result = classify_in(&dir, "late.txt", content.as_bytes());

        assert_eq!(result.category, OTHERS);
        assert_eq!(result.basis, Basis::NoKeyword);
    }

    #[test]
    fn text_without_marker_is_others_not_extension_match() {
        let dir = TempDir::new().unwrap();
        let result = classify_in(&dir, "shopping.txt", b"milk\neggs\n");
        assert_eq!(result.category, OTHERS);
    }

    #[test]
    fn undecodable_text_is_others() {
        let dir = TempDir::new().unwrap();
        let result = classify_in(&dir, "legacy.txt", &[b'S', b't', b'e', b'p', 0xff, b'\n']);

        assert_eq!(result.category, OTHERS);
        assert!(matches!(result.basis, Basis::InspectionFailed(_)));
    }

    #[test]
    fn docx_with_guide_marker() {
        let dir = TempDir::new().unwrap();
        let path = write_docx(dir.path(), "setup.docx", &["Installation Guide", "Intro"]).unwrap();
        let (registry, enabled) = all_enabled();

        let result = classify_file(&path, &registry, &enabled);
        assert_eq!(result.category, INSTRUCTIONS);
    }

    #[test]
    fn corrupt_docx_is_others() {
        let dir = TempDir::new().unwrap();
        let result = classify_in(&dir, "broken.docx", b"PK not really a zip");
        assert_eq!(result.category, OTHERS);
        assert!(matches!(result.basis, Basis::InspectionFailed(_)));
    }

    #[test]
    fn instructions_disabled_skips_sniffing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "Step 1: begin\n").unwrap();

        let (registry, enabled) = all_enabled();
        let enabled = enabled.disable(&registry, INSTRUCTIONS).unwrap();
        let entry = FileEntry::new(&path);

        let result = RuleBasedClassifier::new(&registry).classify(&entry, &enabled);

        assert_eq!(result.category, OTHERS);
        assert!(!entry.is_sampled());
    }

    #[test]
    fn pdf_with_research_marker() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(dir.path(), "paper.pdf", &["Abstract: we study sorting"]).unwrap();
        let (registry, enabled) = all_enabled();

        let result = classify_file(&path, &registry, &enabled);

        assert_eq!(result.category, RESEARCH_PAPERS);
        assert_eq!(result.basis, Basis::Keyword("abstract".to_string()));
    }

    #[test]
    fn pdf_without_marker_is_others() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(dir.path(), "invoice.pdf", &["Invoice 42", "Total due"]).unwrap();
        let (registry, enabled) = all_enabled();

        let result = classify_file(&path, &registry, &enabled);
        assert_eq!(result.category, OTHERS);
        assert_eq!(result.basis, Basis::NoKeyword);
    }

    #[test]
    fn corrupt_pdf_is_others() {
        let dir = TempDir::new().unwrap();
        let result = classify_in(&dir, "broken.pdf", b"%PDF-1.4 garbage \x00\x01\x02");

        assert_eq!(result.category, OTHERS);
        assert!(matches!(result.basis, Basis::InspectionFailed(_)));
    }

    #[test]
    fn content_rule_takes_precedence_over_extension_mapping() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(dir.path(), "paper.pdf", &["1 Introduction"]).unwrap();

        let registry = CategoryRegistry::new(vec![
            Category::new("Documents", [".pdf"]),
            Category::new(RESEARCH_PAPERS, [".pdf"]),
        ])
        .unwrap();
        let enabled = EnabledCategories::all(&registry);

        let result = classify_file(&path, &registry, &enabled);
        assert_eq!(result.category, RESEARCH_PAPERS);
    }

    #[test]
    fn pdf_falls_back_to_extension_when_research_disabled() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(dir.path(), "paper.pdf", &["Abstract"]).unwrap();

        let registry = CategoryRegistry::new(vec![
            Category::new(RESEARCH_PAPERS, [".pdf"]),
            Category::new("Documents", [".pdf"]),
        ])
        .unwrap();
        let enabled = EnabledCategories::all(&registry)
            .disable(&registry, RESEARCH_PAPERS)
            .unwrap();

        let result = classify_file(&path, &registry, &enabled);
        assert_eq!(result.category, "Documents");
        assert_eq!(result.basis, Basis::Extension);
    }

    #[test]
    fn nothing_enabled_sends_everything_to_others() {
        let dir = TempDir::new().unwrap();
        let registry = CategoryRegistry::builtin();
        let enabled = EnabledCategories::none();

        for name in ["a.png", "b.zip", "c.txt", "d.pdf"] {
            let path = dir.path().join(name);
            fs::write(&path, b"Step abstract").unwrap();
            assert_eq!(classify_file(&path, &registry, &enabled).category, OTHERS);
        }
    }
}
