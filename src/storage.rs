/// Reading function records from documentation files.
pub mod input;
pub use input::{LoadError, load_file, load_path};

/// Markdown export of generated documents.
pub mod markdown;
pub use markdown::{save_markdown, write_markdown};
