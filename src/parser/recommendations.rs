use std::sync::LazyLock;

use regex::Regex;

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^- <(.*)>$").unwrap());

const TITLE_MARKER: &str = "# Recommendation(s)";
const TRAILER_PREFIXES: &[&str] = &["for more information", "reference"];

/// Remediation prose with its references trailer split off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recommendation {
    pub resolution: String,
    pub references: Vec<String>,
}

/// Split a raw `recommendations.md` body into prose and reference URLs.
///
/// The title line is dropped when present. Everything from the first
/// "For more information" / "Reference..." line on is the trailer; only
/// `- <url>` bullets inside it are kept, in order.
pub fn split(raw: &str) -> Recommendation {
    let normalized = super::normalize_newlines(raw);
    let mut lines: Vec<&str> = normalized.split('\n').collect();

    if lines.first().is_some_and(|l| l.contains(TITLE_MARKER)) {
        lines.remove(0);
    }

    match lines.iter().position(|l| is_trailer_boundary(l)) {
        Some(idx) => Recommendation {
            resolution: lines[..idx].join("\n").trim().to_string(),
            references: lines[idx + 1..]
                .iter()
                .filter_map(|l| reference_url(l))
                .collect(),
        },
        None => Recommendation {
            resolution: lines.join("\n").trim().to_string(),
            references: Vec::new(),
        },
    }
}

fn is_trailer_boundary(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    TRAILER_PREFIXES.iter().any(|p| lower.starts_with(p))
}

fn reference_url(line: &str) -> Option<String> {
    REFERENCE_RE
        .captures(line.trim())
        .map(|caps| caps[1].to_string())
}

// ── Tests ──
