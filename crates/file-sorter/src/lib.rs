pub mod classifier;
pub mod config;
pub mod error;
pub mod organizer;
pub mod scanner;
pub mod types;
pub mod watch;

pub use classifier::{
    classify_file, Basis, Classification, Classifier, RuleBasedClassifier, INSTRUCTION_KEYWORDS,
    RESEARCH_KEYWORDS,
};
pub use config::Config;
pub use error::OrganizeError;
pub use organizer::{
    organize_directory, ConflictPolicy, OrganizeEvent, OrganizeOptions, Organizer,
};
pub use scanner::scan_directory;
pub use types::{FileEntry, MoveResult, MoveStatus, OrganizeReport};
pub use watch::watch_directory;

pub use file_sorter_core::{
    Category, CategoryError, CategoryRegistry, EnabledCategories, InspectError, TextSample,
    ARCHIVES, IMAGES, INSTRUCTIONS, OTHERS, RESEARCH_PAPERS, SPREADSHEETS,
};
