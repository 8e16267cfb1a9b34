use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;

/// Severity tier written to the `exploitation` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
    Unclassified,
}

/// Ranked tiers, index = priority - 1.
pub const TIERS: [Severity; 5] = [
    Severity::Critical,
    Severity::High,
    Severity::Medium,
    Severity::Low,
    Severity::Info,
];

impl Severity {
    /// Map a taxonomy `priority` value onto a tier. Anything that is not an
    /// integer in 1..=5 is unclassified.
    pub fn from_priority(priority: &Value) -> Severity {
        let rank = match priority {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            _ => None,
        };
        match rank {
            Some(r @ 1..=5) => TIERS[(r - 1) as usize],
            _ => Severity::Unclassified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
            Severity::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyNode {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Kept raw: upstream sometimes carries non-numeric or out-of-range values.
    #[serde(default)]
    pub priority: Option<Value>,
    #[serde(default)]
    pub children: Vec<TaxonomyNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Taxonomy {
    pub content: Vec<TaxonomyNode>,
}

impl Taxonomy {
    pub fn from_slice(bytes: &[u8]) -> Result<Taxonomy> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn from_path(path: &Path) -> Result<Taxonomy> {
        let bytes = std::fs::read(path)?;
        Taxonomy::from_slice(&bytes)
    }
}

/// What the resolver hands back for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub severity: Severity,
    pub hierarchy: Vec<String>,
}

impl Classification {
    pub fn unclassified() -> Self {
        Classification {
            severity: Severity::Unclassified,
            hierarchy: Vec::new(),
        }
    }
}

/// Result of searching one sibling list.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Lookup {
    NotFound,
    Found(Classification),
}

/// Classify a category path fragment (e.g. `server_security_misconfiguration/clickjacking`).
///
/// Matching is by substring: a node matches when its `id` occurs anywhere in
/// the joined path. Siblings are tried in declared order and the first match
/// wins; the first `priority` seen along the matched branch decides the tier.
pub fn resolve(fragment: &str, taxonomy: Option<&Taxonomy>) -> Classification {
    let Some(taxonomy) = taxonomy else {
        return Classification::unclassified();
    };
    match search(&taxonomy.content, fragment, &[]) {
        Lookup::Found(c) => c,
        Lookup::NotFound => Classification::unclassified(),
    }
}

fn search(nodes: &[TaxonomyNode], target: &str, trail: &[String]) -> Lookup {
    for node in nodes {
        if !target.contains(node.id.as_str()) {
            continue;
        }

        let mut hierarchy = trail.to_vec();
        if let Some(name) = node.name.as_deref().filter(|n| !n.is_empty()) {
            hierarchy.push(name.to_string());
        }

        if let Some(priority) = &node.priority {
            return Lookup::Found(Classification {
                severity: Severity::from_priority(priority),
                hierarchy,
            });
        }

        return match search(&node.children, target, &hierarchy) {
            found @ Lookup::Found(_) => found,
            Lookup::NotFound => Lookup::Found(Classification {
                severity: Severity::Unclassified,
                hierarchy,
            }),
        };
    }
    Lookup::NotFound
}

// ── Tests ──
