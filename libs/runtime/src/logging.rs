use crate::config::{LoggingConfig, Section};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::Level;
use tracing_subscriber::{filter::FilterFn, fmt};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

// -------- level helpers --------
fn parse_tracing_level(s: &str) -> Option<tracing::Level> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

// -------- filtering --------

type CrateFilter = FilterFn<Box<dyn Fn(&tracing::Metadata<'_>) -> bool + Send + Sync + 'static>>;

/// Catch-all filter: passes records that do not belong to any explicitly configured subsystem.
fn default_filter_excluding(crate_names: &[String], max_level: tracing::Level) -> CrateFilter {
    let crates = crate_names.to_vec();
    FilterFn::new(Box::new(move |meta: &tracing::Metadata<'_>| {
        let t = meta.target();
        if crates.iter().any(|c| matches_crate_prefix(t, c)) {
            return false;
        }
        meta.level() <= &max_level
    }))
}

/// Returns true if target == crate_name or target starts with "crate_name::"
fn matches_crate_prefix(target: &str, crate_name: &str) -> bool {
    target == crate_name
        || (target.starts_with(crate_name) && target[crate_name.len()..].starts_with("::"))
}

// -------- rotating writer for files --------
#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl RotWriter {
    fn handle(&self) -> RotWriterHandle {
        RotWriterHandle(self.0.clone())
    }
}

#[derive(Clone)]
struct RotWriterHandle(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl Write for RotWriterHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().flush()
    }
}

// A writer handle that may be None (drops writes)
#[derive(Clone)]
struct RoutedWriterHandle(Option<RotWriterHandle>);

impl Write for RoutedWriterHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.0 {
            Some(w) => w.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.0 {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

/// Routes log records to different files by target prefix
/// (keys are crate names such as "recipes" or "api_ingress").
#[derive(Clone)]
struct MultiFileRouter {
    default: Option<RotWriter>,
    by_prefix: HashMap<String, RotWriter>,
}

impl MultiFileRouter {
    fn resolve_for(&self, target: &str) -> Option<RotWriterHandle> {
        self.by_prefix
            .iter()
            .find(|(crate_name, _)| matches_crate_prefix(target, crate_name))
            .map(|(_, w)| w.handle())
            .or_else(|| self.default.as_ref().map(RotWriter::handle))
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for MultiFileRouter {
    type Writer = RoutedWriterHandle;

    fn make_writer(&'a self) -> Self::Writer {
        RoutedWriterHandle(self.default.as_ref().map(RotWriter::handle))
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        RoutedWriterHandle(self.resolve_for(meta.target()))
    }
}

// -------- config extraction --------

struct ConfigData<'a> {
    default_section: Option<&'a Section>,
    crate_sections: Vec<(String, &'a Section)>,
    crate_names: Vec<String>,
}

fn extract_config_data(cfg: &LoggingConfig) -> ConfigData<'_> {
    let crate_sections = cfg
        .iter()
        .filter(|(k, _)| k.as_str() != "default")
        .map(|(k, v)| (k.clone(), v))
        .collect::<Vec<_>>();

    let crate_names = crate_sections.iter().map(|(n, _)| n.clone()).collect();

    ConfigData {
        default_section: cfg.get("default"),
        crate_sections,
        crate_names,
    }
}

// -------- path resolution --------

/// Resolve a log file path against `base_dir` (home_dir).
/// Absolute paths are kept as-is; relative paths are joined with `base_dir`.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

/// Create a rotating writer, ensuring the parent directory exists.
fn create_rotating_writer_at_path(
    log_path: &Path,
    max_bytes: usize,
    max_backups: usize,
) -> std::io::Result<RotWriter> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(FileLimit::MaxFiles(max_backups)),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );

    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

fn file_writer_for_section(label: &str, section: &Section, base_dir: &Path) -> Option<RotWriter> {
    if section.file.trim().is_empty() {
        return None;
    }

    let max_bytes = section.max_size_mb.unwrap_or(100) * 1024 * 1024;
    let max_backups = section.max_backups.unwrap_or(3);
    let log_path = resolve_log_path(&section.file, base_dir);

    match create_rotating_writer_at_path(&log_path, max_bytes as usize, max_backups) {
        Ok(writer) => Some(writer),
        Err(e) => {
            // The subscriber isn't installed yet, so stderr is the only channel.
            eprintln!(
                "Failed to init log file for '{}': {} ({})",
                label,
                log_path.to_string_lossy(),
                e
            );
            None
        }
    }
}

// -------- public init --------

/// Initialize logging from a configuration.
/// - `cfg`: logging sections keyed by subsystem ("default" is the catch-all)
/// - `base_dir`: directory used to resolve relative log file paths (usually server.home_dir)
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` → `tracing` before installing the subscriber
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        init_default_logging();
        return;
    }

    let config_data = extract_config_data(cfg);
    let console_targets = build_console_targets(&config_data);
    let file_targets = build_file_targets(&config_data);
    let file_router = build_file_router(&config_data, base_dir);

    build_logging_layers(config_data, console_targets, file_targets, file_router);
}

fn init_default_logging() {
    let _ = fmt()
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .try_init();
}

fn build_console_targets(config: &ConfigData) -> tracing_subscriber::filter::Targets {
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::filter::Targets;

    let mut targets = Targets::new().with_default(LevelFilter::OFF);
    for (crate_name, section) in &config.crate_sections {
        if let Some(level) = parse_tracing_level(&section.console_level) {
            targets = targets.with_target(crate_name.clone(), LevelFilter::from_level(level));
        }
    }
    targets
}

fn build_file_targets(config: &ConfigData) -> tracing_subscriber::filter::Targets {
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::filter::Targets;

    let mut targets = Targets::new().with_default(LevelFilter::OFF);
    for (crate_name, section) in &config.crate_sections {
        if section.file.trim().is_empty() {
            continue;
        }
        if let Some(level) = parse_tracing_level(&section.file_level) {
            targets = targets.with_target(crate_name.clone(), LevelFilter::from_level(level));
        }
    }
    targets
}

fn build_file_router(config: &ConfigData, base_dir: &Path) -> MultiFileRouter {
    let default = config
        .default_section
        .and_then(|s| file_writer_for_section("default", s, base_dir));

    let by_prefix = config
        .crate_sections
        .iter()
        .filter_map(|(name, section)| {
            file_writer_for_section(name, section, base_dir).map(|w| (name.clone(), w))
        })
        .collect();

    MultiFileRouter { default, by_prefix }
}

fn build_logging_layers(
    config: ConfigData,
    console_targets: tracing_subscriber::filter::Targets,
    file_targets: tracing_subscriber::filter::Targets,
    file_router: MultiFileRouter,
) {
    use tracing_subscriber::{layer::SubscriberExt, prelude::*, Registry};

    let ansi = std::io::stdout().is_terminal();

    let console_layer = fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(console_targets);

    let explicit_file_layer = (!file_router.is_empty()).then(|| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(file_router.clone())
            .with_filter(file_targets)
    });

    let console_default = config
        .default_section
        .and_then(|s| parse_tracing_level(&s.console_level))
        .map(|level| {
            fmt::layer()
                .with_ansi(ansi)
                .with_target(true)
                .with_level(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_filter(default_filter_excluding(&config.crate_names, level))
        });

    let file_default = config
        .default_section
        .filter(|_| file_router.default.is_some())
        .and_then(|s| parse_tracing_level(&s.file_level))
        .map(|level| {
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(file_router.clone())
                .with_filter(default_filter_excluding(&config.crate_names, level))
        });

    let _ = Registry::default()
        .with(console_layer)
        .with(explicit_file_layer)
        .with(console_default)
        .with(file_default)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_logging_config, AppConfig};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_logging_level_parsing() {
        assert_eq!(parse_tracing_level("trace"), Some(Level::TRACE));
        assert_eq!(parse_tracing_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_tracing_level("Info"), Some(Level::INFO));
        assert_eq!(parse_tracing_level("warn"), Some(Level::WARN));
        assert_eq!(parse_tracing_level("ERROR"), Some(Level::ERROR));
        assert_eq!(parse_tracing_level("off"), None);
        assert_eq!(parse_tracing_level("none"), None);
        assert_eq!(parse_tracing_level("invalid"), Some(Level::INFO));
    }

    #[test]
    fn test_crate_prefix_matching() {
        assert!(matches_crate_prefix("recipes", "recipes"));
        assert!(matches_crate_prefix("recipes::domain::service", "recipes"));
        assert!(!matches_crate_prefix("recipes_extra", "recipes"));
        assert!(!matches_crate_prefix("users", "recipes"));
    }

    #[test]
    fn test_extract_config_data_splits_default() {
        let mut cfg = default_logging_config();
        cfg.insert(
            "recipes".into(),
            Section {
                console_level: "info".into(),
                file: "logs/recipes.log".into(),
                file_level: "debug".into(),
                max_age_days: Some(7),
                max_backups: Some(3),
                max_size_mb: Some(10),
            },
        );

        let data = extract_config_data(&cfg);
        assert!(data.default_section.is_some());
        assert_eq!(data.crate_sections.len(), 1);
        assert_eq!(data.crate_names, vec!["recipes".to_string()]);
    }

    #[test]
    fn test_file_paths_resolved_against_home_dir() {
        let tmp = tempdir().unwrap();
        let base_dir = tmp.path();

        let resolved = resolve_log_path("logs/test.log", base_dir);
        assert!(resolved.starts_with(base_dir));
        assert!(resolved.ends_with("logs/test.log"));

        let abs = base_dir.join("abs.log");
        assert_eq!(resolve_log_path(&abs.to_string_lossy(), Path::new("/other")), abs);
    }

    #[test]
    fn test_create_rotating_writer_at_path_creates_parent() {
        let tmp = tempdir().unwrap();
        let p = tmp.path().join("nested/dir/app.log");

        let res = create_rotating_writer_at_path(&p, 128 * 1024, 2);
        assert!(res.is_ok(), "writer should be created");
        assert!(p.parent().unwrap().exists(), "parent dir must be created");
    }

    #[test]
    fn test_router_prefers_explicit_subsystem_file() {
        let tmp = tempdir().unwrap();
        let mut cfg = default_logging_config();
        cfg.get_mut("default").unwrap().file = "logs/default.log".into();
        cfg.insert(
            "recipes".into(),
            Section {
                console_level: "off".into(),
                file: "logs/recipes.log".into(),
                file_level: "debug".into(),
                max_age_days: None,
                max_backups: None,
                max_size_mb: Some(1),
            },
        );

        let data = extract_config_data(&cfg);
        let router = build_file_router(&data, tmp.path());

        assert!(!router.is_empty());
        let explicit = router.resolve_for("recipes::api").unwrap();
        let fallback = router.resolve_for("users::api").unwrap();
        assert!(Arc::ptr_eq(&explicit.0, &router.by_prefix["recipes"].0));
        assert!(Arc::ptr_eq(&fallback.0, &router.default.as_ref().unwrap().0));
    }

    #[test]
    fn test_empty_file_disables_writer() {
        let tmp = tempdir().unwrap();
        let mut cfg = default_logging_config();
        cfg.get_mut("default").unwrap().file = String::new();

        let router = build_file_router(&extract_config_data(&cfg), tmp.path());
        assert!(router.is_empty());
        assert!(router.resolve_for("anything").is_none());
    }

    #[test]
    fn test_config_logging_integration_with_base_dir() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("test_config.yaml");
        let home = temp_dir
            .path()
            .join("home")
            .to_string_lossy()
            .replace('\\', "/");

        let yaml_content = format!(
            r#"
server:
  home_dir: "{home}"
  host: "127.0.0.1"
  port: 8088

logging:
  default:
    console_level: info
    file: ""
    file_level: debug
  api_ingress:
    console_level: debug
    file: "logs/api_test.log"
    file_level: warn
    max_size_mb: 5
    max_backups: 2
"#
        );

        fs::write(&config_path, yaml_content).unwrap();

        let config = AppConfig::load_layered(&config_path).unwrap();

        let abs = resolve_log_path("logs/api_test.log", Path::new(&config.server.home_dir));
        assert!(abs.starts_with(&config.server.home_dir));
        assert!(abs.ends_with("logs/api_test.log"));
    }
}
