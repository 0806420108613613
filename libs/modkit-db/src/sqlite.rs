//! SQLite DSN helpers: memory detection, path preparation and the PRAGMA whitelist.

use std::path::{Path, PathBuf};

/// Query parameters we interpret ourselves; SQLx never sees them.
const SQLITE_PRAGMA_PARAMS: &[&str] = &["wal", "synchronous", "busy_timeout", "journal_mode"];

/// Returns true for `sqlite::memory:`, `sqlite://memory:` and any DSN with `mode=memory`.
pub(crate) fn is_memory_dsn(dsn: &str) -> bool {
    if dsn.contains(":memory:") || dsn.contains("//memory:") {
        return true;
    }
    split_query(dsn)
        .1
        .iter()
        .any(|(k, v)| k.eq_ignore_ascii_case("mode") && v.eq_ignore_ascii_case("memory"))
}

fn split_query(dsn: &str) -> (&str, Vec<(String, String)>) {
    match dsn.split_once('?') {
        Some((head, query)) => {
            let pairs = query
                .split('&')
                .filter(|p| !p.is_empty())
                .map(|p| match p.split_once('=') {
                    Some((k, v)) => (k.to_string(), v.to_string()),
                    None => (p.to_string(), String::new()),
                })
                .collect();
            (head, pairs)
        }
        None => (dsn, Vec::new()),
    }
}

fn join_query(head: &str, pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return head.to_string();
    }
    let q = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{head}?{q}")
}

fn strip_scheme(head: &str) -> &str {
    head.strip_prefix("sqlite://")
        .or_else(|| head.strip_prefix("sqlite:"))
        .unwrap_or(head)
}

/// Make a file DSN absolute against `base_dir` and ask SQLx to create the file if missing.
///
/// `sqlite://database/recipes.db` with base `/srv/app` becomes
/// `sqlite:///srv/app/database/recipes.db?mode=rwc`. Memory DSNs are returned unchanged.
pub fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path) -> String {
    if is_memory_dsn(dsn) {
        return dsn.to_string();
    }

    let (head, mut pairs) = split_query(dsn);
    let raw = strip_scheme(head);
    let path = Path::new(raw);
    let abs: PathBuf = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    };
    let abs = abs.to_string_lossy().replace('\\', "/");
    let abs = abs.trim_start_matches('/');

    if !pairs.iter().any(|(k, _)| k.eq_ignore_ascii_case("mode")) {
        pairs.push(("mode".to_string(), "rwc".to_string()));
    }

    join_query(&format!("sqlite:///{abs}"), &pairs)
}

/// Filesystem path of a file DSN, `None` for memory databases.
pub(crate) fn file_path_from_dsn(dsn: &str) -> Option<PathBuf> {
    if is_memory_dsn(dsn) {
        return None;
    }
    let (head, _) = split_query(dsn);
    let raw = strip_scheme(head);
    if raw.is_empty() || raw == "/" {
        return None;
    }
    Some(PathBuf::from(raw))
}

/// Create the parent directory of a file DSN when `create_dirs` is set.
pub(crate) fn prepare_sqlite_path(dsn: &str, create_dirs: bool) -> std::io::Result<()> {
    if !create_dirs {
        return Ok(());
    }
    if let Some(parent) = file_path_from_dsn(dsn).as_deref().and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Validated PRAGMA statements requested via DSN query parameters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Pragmas {
    pub journal_mode: Option<String>,
    pub synchronous: Option<String>,
    pub busy_timeout: Option<i64>,
}

/// Split whitelisted PRAGMA parameters out of the DSN.
///
/// Returns the DSN SQLx should connect with and the validated pragmas.
/// Invalid values are dropped with a warning.
pub(crate) fn extract_sqlite_pragmas(dsn: &str) -> (String, Pragmas) {
    let (head, pairs) = split_query(dsn);
    let mut pragmas = Pragmas::default();
    let mut keep = Vec::new();

    for (key, value) in pairs {
        let key_lower = key.to_ascii_lowercase();
        if !SQLITE_PRAGMA_PARAMS.contains(&key_lower.as_str()) {
            keep.push((key, value));
            continue;
        }
        let accepted = match key_lower.as_str() {
            "wal" => validate_wal(&value).map(|v| pragmas.journal_mode = Some(v)),
            "journal_mode" => validate_journal_mode(&value).map(|v| pragmas.journal_mode = Some(v)),
            "synchronous" => validate_synchronous(&value).map(|v| pragmas.synchronous = Some(v)),
            "busy_timeout" => validate_busy_timeout(&value).map(|v| pragmas.busy_timeout = Some(v)),
            _ => None,
        };
        if accepted.is_none() {
            tracing::warn!(param = %key, value = %value, "invalid SQLite PRAGMA value in DSN, ignoring");
        }
    }

    (join_query(head, &keep), pragmas)
}

fn validate_wal(value: &str) -> Option<String> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Some("WAL".to_string()),
        "false" | "0" => Some("DELETE".to_string()),
        _ => None,
    }
}

fn validate_synchronous(value: &str) -> Option<String> {
    let v = value.to_ascii_uppercase();
    matches!(v.as_str(), "OFF" | "NORMAL" | "FULL" | "EXTRA").then_some(v)
}

fn validate_busy_timeout(value: &str) -> Option<i64> {
    value.parse::<i64>().ok().filter(|&t| t >= 0)
}

fn validate_journal_mode(value: &str) -> Option<String> {
    let v = value.to_ascii_uppercase();
    matches!(
        v.as_str(),
        "DELETE" | "WAL" | "MEMORY" | "TRUNCATE" | "PERSIST" | "OFF"
    )
    .then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_dsns_are_detected() {
        assert!(is_memory_dsn("sqlite::memory:"));
        assert!(is_memory_dsn("sqlite://memory:"));
        assert!(is_memory_dsn("sqlite:file:memdb?mode=memory&cache=shared"));
        assert!(!is_memory_dsn("sqlite:///srv/app/db.sqlite"));
    }

    #[test]
    fn relative_dsn_is_anchored_at_base_dir() {
        let dsn = absolutize_sqlite_dsn("sqlite://database/recipes.db", Path::new("/srv/app"));
        assert_eq!(dsn, "sqlite:///srv/app/database/recipes.db?mode=rwc");
    }

    #[test]
    fn absolute_dsn_keeps_path_and_params() {
        let dsn = absolutize_sqlite_dsn("sqlite:///data/r.db?wal=true", Path::new("/ignored"));
        assert_eq!(dsn, "sqlite:///data/r.db?wal=true&mode=rwc");

        let explicit = absolutize_sqlite_dsn("sqlite:///data/r.db?mode=ro", Path::new("/x"));
        assert_eq!(explicit, "sqlite:///data/r.db?mode=ro");
    }

    #[test]
    fn memory_dsn_is_not_absolutized() {
        assert_eq!(
            absolutize_sqlite_dsn("sqlite::memory:", Path::new("/srv")),
            "sqlite::memory:"
        );
    }

    #[test]
    fn file_path_extraction() {
        assert_eq!(
            file_path_from_dsn("sqlite:///abs/db.sqlite?wal=true"),
            Some(PathBuf::from("/abs/db.sqlite"))
        );
        assert_eq!(file_path_from_dsn("sqlite:test.db"), Some(PathBuf::from("test.db")));
        assert_eq!(file_path_from_dsn("sqlite::memory:"), None);
    }

    #[test]
    fn prepare_creates_parent_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("nested/dir/app.db");
        let dsn = format!("sqlite://{}", db.to_string_lossy());
        prepare_sqlite_path(&dsn, true).unwrap();
        assert!(db.parent().unwrap().is_dir());
    }

    #[test]
    fn pragmas_are_validated_and_stripped() {
        let (clean, p) = extract_sqlite_pragmas(
            "sqlite:///t.db?wal=true&synchronous=full&busy_timeout=10000&mode=rwc&unknown=1",
        );
        assert_eq!(clean, "sqlite:///t.db?mode=rwc&unknown=1");
        assert_eq!(p.journal_mode.as_deref(), Some("WAL"));
        assert_eq!(p.synchronous.as_deref(), Some("FULL"));
        assert_eq!(p.busy_timeout, Some(10000));
    }

    #[test]
    fn invalid_pragmas_are_ignored() {
        let (clean, p) = extract_sqlite_pragmas(
            "sqlite:///t.db?wal=maybe&synchronous=yes&busy_timeout=-1&journal_mode=true",
        );
        assert_eq!(clean, "sqlite:///t.db");
        assert_eq!(p, Pragmas::default());
    }

    #[test]
    fn pragma_keys_are_case_insensitive() {
        let (_, p) = extract_sqlite_pragmas("sqlite:///t.db?WAL=0&Synchronous=Normal");
        assert_eq!(p.journal_mode.as_deref(), Some("DELETE"));
        assert_eq!(p.synchronous.as_deref(), Some("NORMAL"));
    }
}
