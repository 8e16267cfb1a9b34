use std::io::Cursor;
use std::path::{Path, PathBuf};

use tracing::info;
use zip::ZipArchive;

use crate::config::{self, USER_AGENT};
use crate::error::{HarvestError, Result};
use crate::parser::Taxonomy;

pub fn client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}

async fn get_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    Ok(bytes.to_vec())
}

/// Download the templates archive. Any transport error or non-2xx status is fatal.
pub async fn fetch_archive(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    info!("Fetching templates archive: {}", url);
    let bytes = get_bytes(client, url).await?;
    info!("Archive size: {} bytes", bytes.len());
    Ok(bytes)
}

/// Download and parse the taxonomy document.
pub async fn fetch_taxonomy(client: &reqwest::Client, url: &str) -> Result<Taxonomy> {
    info!("Fetching taxonomy: {}", url);
    let bytes = get_bytes(client, url).await?;
    let taxonomy = Taxonomy::from_slice(&bytes)?;
    info!("Taxonomy top-level categories: {}", taxonomy.content.len());
    Ok(taxonomy)
}

/// Unpack `archive` into `dest` and return the templates directory inside it.
pub fn extract_archive(archive: &[u8], dest: &Path) -> Result<PathBuf> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    info!("Extracting {} entries to {}", zip.len(), dest.display());
    zip.extract(dest)?;

    let templates = config::templates_dir(dest);
    if !templates.is_dir() {
        return Err(HarvestError::MissingTemplates(templates));
    }
    Ok(templates)
}

// ── Tests ──
