pub mod recommendations;
pub mod taxonomy;

pub use recommendations::{split, Recommendation};
pub use taxonomy::{resolve, Severity, Taxonomy};

/// Fold `\r\n` and lone `\r` line endings into `\n`.
pub fn normalize_newlines(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n")
}
