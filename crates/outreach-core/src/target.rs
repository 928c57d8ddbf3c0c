use crate::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use url::Url;

/// Column-name fragments that suggest a column holds profile links, used
/// when the configured URL column is missing from the input file.
const URL_COLUMN_HINTS: &[&str] = &["url", "link", "profile"];

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/([A-Za-z0-9][A-Za-z0-9._-]*)/?$").unwrap());

/// One profile the engine will act against. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Target {
    /// Normalized profile URL.
    pub profile_url: String,
    /// Name taken from the configured name column, if any.
    pub name: Option<String>,
    /// All other columns from the input row, for template substitution.
    pub fields: HashMap<String, String>,
}

impl Target {
    /// Display name for personalization: the name column when present,
    /// otherwise a title-cased guess from the URL slug.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            let trimmed = name.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }

        slug_from_url(&self.profile_url)
            .map(|slug| title_case(&slug))
            .unwrap_or_else(|| "there".to_string())
    }
}

/// Load the ordered target queue from a CSV file.
///
/// Rows with an empty or unusable profile reference are skipped with a
/// warning rather than failing the whole load.
pub fn load_targets(
    path: &Path,
    url_column: &str,
    name_column: Option<&str>,
) -> Result<Vec<Target>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let url_column = resolve_url_column(&headers, url_column)?;

    let mut targets = Vec::new();

    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        let fields: HashMap<String, String> = headers
            .iter()
            .cloned()
            .zip(row.iter().map(str::to_string))
            .collect();

        let raw = fields.get(&url_column).map(String::as_str).unwrap_or("");
        let Some(profile_url) = normalize_profile_url(raw) else {
            tracing::warn!("Skipping row {}: unusable profile URL {:?}", idx + 2, raw);
            continue;
        };

        let name = name_column
            .and_then(|column| fields.get(column))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        targets.push(Target {
            profile_url,
            name,
            fields,
        });
    }

    tracing::info!("Loaded {} targets from {}", targets.len(), path.display());
    Ok(targets)
}

/// Resolve the profile-URL column, falling back to any column whose name
/// looks like it holds links when the configured one is absent.
fn resolve_url_column(headers: &[String], requested: &str) -> Result<String> {
    if headers.iter().any(|header| header == requested) {
        return Ok(requested.to_string());
    }

    let candidate = headers.iter().find(|header| {
        let lower = header.to_lowercase();
        URL_COLUMN_HINTS.iter().any(|hint| lower.contains(hint))
    });

    match candidate {
        Some(column) => {
            tracing::warn!(
                "Column '{}' not found, using '{}' for profile URLs instead",
                requested,
                column
            );
            Ok(column.clone())
        }
        None => Err(Error::InvalidTargets(format!(
            "column '{}' not found and no alternative looks like a URL column (available: {})",
            requested,
            headers.join(", ")
        ))),
    }
}

/// Normalize a profile reference to a canonical https URL with query and
/// fragment stripped. Returns `None` for values that are not profile
/// links at all (empty, host-only, unparseable).
pub fn normalize_profile_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let mut url = Url::parse(&with_scheme).ok()?;
    if url.host_str().is_none() || url.path().len() <= 1 {
        return None;
    }

    url.set_query(None);
    url.set_fragment(None);

    Some(url.to_string().trim_end_matches('/').to_string())
}

/// Extract the trailing path segment of a profile URL, e.g.
/// `https://host/in/jane-doe` -> `jane-doe`.
pub fn slug_from_url(url: &str) -> Option<String> {
    SLUG_RE
        .captures(url)
        .map(|captures| captures[1].to_string())
}

fn title_case(slug: &str) -> String {
    slug.split(['-', '.', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("targets.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_targets_with_configured_columns() {
        let (_dir, path) = write_csv(
            "profile,full_name,company\n\
             https://example.com/in/jane-doe,Jane Doe,Acme\n\
             https://example.com/in/john-roe,,Globex\n",
        );

        let targets = load_targets(&path, "profile", Some("full_name")).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].display_name(), "Jane Doe");
        assert_eq!(targets[0].fields.get("company").unwrap(), "Acme");
        // Empty name column falls back to the URL slug.
        assert_eq!(targets[1].display_name(), "John Roe");
    }

    #[test]
    fn test_url_column_fallback_by_hint() {
        let (_dir, path) = write_csv(
            "linkedin_url,full_name\n\
             https://example.com/in/jane-doe,Jane Doe\n",
        );

        let targets = load_targets(&path, "profile", None).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].profile_url, "https://example.com/in/jane-doe");
    }

    #[test]
    fn test_missing_url_column_is_an_error() {
        let (_dir, path) = write_csv("name,company\nJane,Acme\n");
        assert!(load_targets(&path, "profile", None).is_err());
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let (_dir, path) = write_csv(
            "profile\n\
             https://example.com/in/jane-doe\n\
             \n\
             not a url at all\n",
        );

        let targets = load_targets(&path, "profile", None).unwrap();
        assert_eq!(targets.len(), 1);
    }

    #[test]
    fn test_normalize_adds_scheme_and_strips_query() {
        assert_eq!(
            normalize_profile_url("example.com/in/jane-doe?src=search#top"),
            Some("https://example.com/in/jane-doe".to_string())
        );
        assert_eq!(
            normalize_profile_url("https://example.com/in/jane-doe/"),
            Some("https://example.com/in/jane-doe".to_string())
        );
        assert_eq!(normalize_profile_url(""), None);
        assert_eq!(normalize_profile_url("https://example.com/"), None);
    }

    #[test]
    fn test_slug_extraction() {
        assert_eq!(
            slug_from_url("https://example.com/in/jane-doe"),
            Some("jane-doe".to_string())
        );
        assert_eq!(slug_from_url("https://example.com/"), None);
    }
}
