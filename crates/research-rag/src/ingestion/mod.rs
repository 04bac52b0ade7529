//! Document ingestion: directory loading, multi-format parsing and node splitting

mod loader;
mod parser;
mod splitter;

pub use loader::{load_documents, DirectoryLoader, LoadOutcome, SkippedFile};
pub use parser::{FileParser, PageContent, ParsedDocument};
pub use splitter::NodeSplitter;
