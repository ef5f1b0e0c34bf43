pub mod category;
pub mod sample;
#[cfg(any(test, feature = "fixtures"))]
pub mod testutils;

pub use category::{
    normalize_extension, Category, CategoryError, CategoryRegistry, EnabledCategories, ARCHIVES,
    CONTENT_SNIFFED, IMAGES, INSTRUCTIONS, OTHERS, RESEARCH_PAPERS, SPREADSHEETS,
};
pub use sample::{
    sample_docx, sample_pdf, sample_text, InspectError, SampleKind, TextSample, MAX_DOC_PARAGRAPHS,
    MAX_PDF_PAGES, MAX_TEXT_BYTES, MAX_TEXT_LINES,
};
