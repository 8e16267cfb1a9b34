use std::path::{Path, PathBuf};

pub const ARCHIVE_URL: &str = "https://github.com/bugcrowd/templates/archive/refs/heads/master.zip";
pub const TAXONOMY_URL: &str = "https://raw.githubusercontent.com/bugcrowd/vulnerability-rating-taxonomy/master/vulnerability-rating-taxonomy.json";

/// Top-level directory GitHub puts inside the branch archive.
pub const ARCHIVE_ROOT: &str = "templates-master";
pub const TEMPLATES_SUBDIR: &str = "submissions/description";

pub const OUTPUT_PATH: &str = "vulnerabilities.csv";
pub const TEMP_PREFIX: &str = "templates-";

pub const DESCRIPTION_FILE: &str = "template.md";
pub const RECOMMENDATIONS_FILE: &str = "recommendations.md";

pub const USER_AGENT: &str = concat!("template_harvester/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct Settings {
    pub archive_url: String,
    pub taxonomy_url: String,
    pub output: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            archive_url: ARCHIVE_URL.to_string(),
            taxonomy_url: TAXONOMY_URL.to_string(),
            output: PathBuf::from(OUTPUT_PATH),
        }
    }
}

impl Settings {
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        if let Some(p) = output {
            self.output = p;
        }
        self
    }
}

/// Where the templates tree lands once the archive is extracted under `extract_root`.
pub fn templates_dir(extract_root: &Path) -> PathBuf {
    extract_root.join(ARCHIVE_ROOT).join(TEMPLATES_SUBDIR)
}
