use std::fs;
use std::io;
use std::path::{Path, MAIN_SEPARATOR_STR};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{DESCRIPTION_FILE, RECOMMENDATIONS_FILE};
use crate::error::Result;
use crate::output::CategoryRecord;
use crate::parser::{self, Recommendation, Taxonomy};

pub(crate) const NAME_SEPARATOR: &str = " - ";

/// Walk `root` and build one record per directory holding both a
/// description and a recommendations file.
///
/// Siblings are visited in file-name order, parents before children, so the
/// output is stable across runs and platforms. The root itself is never a
/// category.
pub fn harvest(root: &Path, taxonomy: Option<&Taxonomy>) -> Result<Vec<CategoryRecord>> {
    let mut records = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            // Only an unreadable root is fatal; anything below it is skipped.
            Err(e) if e.depth() == 0 => return Err(io::Error::from(e).into()),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let dir = entry.path();
        let description_path = dir.join(DESCRIPTION_FILE);
        let recommendations_path = dir.join(RECOMMENDATIONS_FILE);
        if !description_path.is_file() || !recommendations_path.is_file() {
            continue;
        }

        let segments = relative_segments(root, dir);
        let fragment = segments.join(MAIN_SEPARATOR_STR);
        let classification = parser::resolve(&fragment, taxonomy);

        let name = if classification.hierarchy.is_empty() {
            derive_name(&segments)
        } else {
            classification.hierarchy.join(NAME_SEPARATOR)
        };

        let description = match fs::read_to_string(&description_path) {
            Ok(text) => parser::normalize_newlines(&text).trim().to_string(),
            Err(e) => {
                warn!("Unreadable {}: {}", description_path.display(), e);
                String::new()
            }
        };

        let Recommendation { resolution, references } = match fs::read_to_string(&recommendations_path) {
            Ok(text) => parser::split(&text),
            Err(e) => {
                warn!("Unreadable {}: {}", recommendations_path.display(), e);
                Recommendation::default()
            }
        };

        debug!(%fragment, severity = %classification.severity, "category");
        records.push(CategoryRecord {
            name,
            description,
            resolution,
            exploitation: classification.severity,
            references,
        });
    }

    Ok(records)
}

fn relative_segments(root: &Path, dir: &Path) -> Vec<String> {
    dir.strip_prefix(root)
        .unwrap_or(dir)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect()
}

/// `["web_app", "sql_injection"]` → `"Web App - Sql Injection"`.
pub fn derive_name<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| title_case(&s.as_ref().replace('_', " ")))
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR)
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Severity;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn category(root: &Path, rel: &str, description: Option<&str>, recs: Option<&str>) -> PathBuf {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        if let Some(d) = description {
            fs::write(dir.join(DESCRIPTION_FILE), d).unwrap();
        }
        if let Some(r) = recs {
            fs::write(dir.join(RECOMMENDATIONS_FILE), r).unwrap();
        }
        dir
    }

    fn taxonomy() -> Taxonomy {
        Taxonomy::from_path(Path::new("tests/fixtures/taxonomy.json")).unwrap()
    }

    #[test]
    fn title_case_matches_word_rules() {
        assert_eq!(title_case("sql injection"), "Sql Injection");
        assert_eq!(title_case("XSS"), "Xss");
        assert_eq!(title_case("2fa bypass"), "2Fa Bypass");
        assert_eq!(title_case("oauth2 misconfig"), "Oauth2 Misconfig");
    }

    #[test]
    fn derive_name_joins_segments() {
        assert_eq!(derive_name(&["web_app", "sql_injection"]), "Web App - Sql Injection");
        assert_eq!(derive_name::<&str>(&[]), "");
    }

    #[test]
    fn only_complete_categories_emitted() {
        let tmp = TempDir::new().unwrap();
        category(tmp.path(), "a/complete", Some("desc"), Some("rec"));
        category(tmp.path(), "a/no_recs", Some("desc"), None);
        category(tmp.path(), "a/no_desc", None, Some("rec"));
        let records = harvest(tmp.path(), None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "A - Complete");
    }

    #[test]
    fn root_is_never_a_category() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(DESCRIPTION_FILE), "root").unwrap();
        fs::write(tmp.path().join(RECOMMENDATIONS_FILE), "root").unwrap();
        category(tmp.path(), "child", Some("d"), Some("r"));
        let records = harvest(tmp.path(), None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Child");
    }

    #[test]
    fn fallback_name_without_taxonomy_match() {
        let tmp = TempDir::new().unwrap();
        category(
            tmp.path(),
            "web_app/sql_injection",
            Some("  Injected SQL.\n"),
            Some("# Recommendation(s)\n\nUse binds.\n\nReferences\n- <https://owasp.org>\n"),
        );
        let records = harvest(tmp.path(), Some(&taxonomy())).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.name, "Web App - Sql Injection");
        assert_eq!(r.description, "Injected SQL.");
        assert_eq!(r.resolution, "Use binds.");
        assert_eq!(r.exploitation, Severity::Unclassified);
        assert_eq!(r.references, vec!["https://owasp.org"]);
    }

    #[test]
    fn taxonomy_supplies_name_and_tier() {
        let tmp = TempDir::new().unwrap();
        category(
            tmp.path(),
            "server_security_misconfiguration/clickjacking/sensitive_action",
            Some("d"),
            Some("r"),
        );
        let records = harvest(tmp.path(), Some(&taxonomy())).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].name,
            "Server Security Misconfiguration - Clickjacking - Sensitive Action"
        );
        assert_eq!(records[0].exploitation, Severity::Low);
    }

    #[test]
    fn missing_taxonomy_still_emits_everything() {
        let tmp = TempDir::new().unwrap();
        category(tmp.path(), "server_security_misconfiguration/clickjacking", Some("d"), Some("r"));
        category(tmp.path(), "sensitive_data_exposure/disclosure_of_secrets", Some("d"), Some("r"));
        let records = harvest(tmp.path(), None).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.exploitation == Severity::Unclassified));
        assert_eq!(records[0].name, "Sensitive Data Exposure - Disclosure Of Secrets");
    }

    #[test]
    fn parent_and_child_both_emitted_in_order() {
        let tmp = TempDir::new().unwrap();
        category(tmp.path(), "b", Some("d"), Some("r"));
        category(tmp.path(), "b/inner", Some("d"), Some("r"));
        category(tmp.path(), "a", Some("d"), Some("r"));
        let names: Vec<String> = harvest(tmp.path(), None)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["A", "B", "B - Inner"]);
    }

    #[test]
    fn unreadable_file_becomes_empty_field() {
        let tmp = TempDir::new().unwrap();
        let dir = category(tmp.path(), "broken", Some("d"), None);
        // Invalid UTF-8 fails read_to_string without depending on permissions.
        fs::write(dir.join(RECOMMENDATIONS_FILE), [0xff, 0xfe, 0xfd]).unwrap();
        let records = harvest(tmp.path(), None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "d");
        assert_eq!(records[0].resolution, "");
        assert!(records[0].references.is_empty());
    }

    #[test]
    fn crlf_description_normalised() {
        let tmp = TempDir::new().unwrap();
        category(tmp.path(), "xss", Some("First line\r\nsecond\rthird\r\n"), Some("r"));
        let records = harvest(tmp.path(), None).unwrap();
        assert_eq!(records[0].description, "First line\nsecond\nthird");
    }

    #[cfg(unix)]
    #[test]
    fn unlistable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        category(tmp.path(), "a/readable", Some("d"), Some("r"));
        let locked = category(tmp.path(), "b/locked", Some("d"), Some("r"));
        category(tmp.path(), "c/readable", Some("d"), Some("r"));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not stop a privileged user; nothing to check then.
        let enforced = fs::read_dir(&locked).is_err();
        let result = harvest(tmp.path(), None);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if !enforced {
            return;
        }

        let names: Vec<String> = result.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["A - Readable", "C - Readable"]);
    }

    #[test]
    fn repeated_harvest_is_identical() {
        let tmp = TempDir::new().unwrap();
        for rel in ["x/one", "x/two", "y", "server_security_misconfiguration/clickjacking"] {
            category(tmp.path(), rel, Some("desc"), Some("fix\nReferences\n- <https://r>"));
        }
        let t = taxonomy();
        let first = harvest(tmp.path(), Some(&t)).unwrap();
        let second = harvest(tmp.path(), Some(&t)).unwrap();
        assert_eq!(first, second);

        let mut a = Vec::new();
        let mut b = Vec::new();
        crate::output::write_records(&mut a, &first).unwrap();
        crate::output::write_records(&mut b, &second).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_root_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(harvest(&tmp.path().join("absent"), None).is_err());
    }
}
