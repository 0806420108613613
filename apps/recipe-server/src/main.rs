use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use modkit::{
    runtime::{run, DbOptions, RunOptions, ShutdownOptions},
    ClientHub, ModuleCtxBuilder, ModuleRegistry, RegistryBuilder,
};
use modkit_auth::JwtKeys;
use modkit_db::{absolutize_sqlite_dsn, ConnectOpts, DbHandle};
use runtime::{AppConfig, AppConfigProvider, CliArgs, DatabaseConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MEMORY_DSN: &str = "sqlite::memory:";

/// Recipe API server
#[derive(Parser)]
#[command(name = "recipe-server")]
#[command(about = "Recipe API server - recipes, tags and ingredients per user")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
    /// Create an administrator account
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);
    derive_ingress_config(&mut config, &args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, &config.home_dir());
    tracing::info!("Recipe server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config, &args),
        Commands::CreateSuperuser { email, password } => {
            create_superuser(config, args, &email, &password).await
        }
    }
}

/// Fills `modules.api_ingress.bind_addr` from `server.host:port` unless set explicitly.
/// An explicit `--port` always wins.
fn derive_ingress_config(config: &mut AppConfig, args: &CliArgs) {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let timeout = config.server.timeout_sec;
    let section = config
        .modules
        .entry(api_ingress::MODULE_NAME.to_string())
        .or_insert_with(|| serde_json::json!({}));
    if let Some(obj) = section.as_object_mut() {
        if args.port.is_some() || !obj.contains_key("bind_addr") {
            obj.insert("bind_addr".into(), serde_json::Value::String(bind_addr));
        }
        if timeout > 0 && !obj.contains_key("request_timeout_secs") {
            obj.insert("request_timeout_secs".into(), timeout.into());
        }
    }
}

/// Detect DB backend from URL scheme (sqlite/postgres).
fn detect_from_dsn(cfg: &DatabaseConfig) -> Result<&'static str> {
    let raw = cfg.url.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    if raw.eq_ignore_ascii_case(MEMORY_DSN) {
        return Ok("sqlite");
    }

    let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;
    match url.scheme() {
        "sqlite" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

async fn connect_db(config: &AppConfig, args: &CliArgs) -> Result<DbHandle> {
    let db_config = match (&config.database, args.mock) {
        (_, true) => None,
        (Some(db), false) => Some(db.clone()),
        (None, false) => return Err(anyhow!("Database URL not configured")),
    };

    let dsn = match &db_config {
        None => MEMORY_DSN.to_string(),
        Some(db) => match detect_from_dsn(db)? {
            // Relative sqlite paths are anchored at the home dir, not the cwd.
            "sqlite" => absolutize_sqlite_dsn(db.url.trim(), &config.home_dir()),
            _ => db.url.trim().to_string(),
        },
    };

    let connect_opts = ConnectOpts {
        max_conns: db_config.as_ref().and_then(|d| d.max_conns),
        acquire_timeout: Some(Duration::from_secs(5)),
        busy_timeout_ms: db_config
            .as_ref()
            .and_then(|d| d.busy_timeout_ms)
            .unwrap_or(5000),
        create_sqlite_dirs: true,
        ..Default::default()
    };

    tracing::info!("Connecting to database: {}", redact_dsn(&dsn));
    let db = DbHandle::connect(&dsn, connect_opts)
        .await
        .context("database connection failed")?;
    tracing::info!("Connected DB backend: {:?}", db.engine());
    Ok(db)
}

/// Hides the password part of a DSN for logging.
fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        _ => dsn.to_string(),
    }
}

fn jwt_keys(config: &AppConfig) -> Result<Arc<JwtKeys>> {
    let ttl = config.auth.token_ttl_secs;
    let keys = if config.auth.secret.is_empty() {
        tracing::warn!("auth.secret is empty; tokens will not survive a restart");
        JwtKeys::ephemeral(ttl)?
    } else {
        JwtKeys::new(config.auth.secret.as_bytes(), ttl)?
    };
    Ok(Arc::new(keys))
}

fn build_registry() -> Result<ModuleRegistry> {
    let ingress = Arc::new(api_ingress::ApiIngress::default());
    let users = Arc::new(users::Users::default());
    let recipes = Arc::new(recipes::Recipes::default());

    let mut b = RegistryBuilder::default();
    b.register_core_with_meta(api_ingress::MODULE_NAME, &[], ingress.clone());
    b.register_rest_host_with_meta(api_ingress::MODULE_NAME, ingress.clone());
    b.register_stateful_with_meta(api_ingress::MODULE_NAME, ingress);

    b.register_core_with_meta(users::MODULE_NAME, &[api_ingress::MODULE_NAME], users.clone());
    b.register_db_with_meta(users::MODULE_NAME, users.clone());
    b.register_rest_with_meta(users::MODULE_NAME, users);

    b.register_core_with_meta(
        recipes::MODULE_NAME,
        &[api_ingress::MODULE_NAME],
        recipes.clone(),
    );
    b.register_db_with_meta(recipes::MODULE_NAME, recipes.clone());
    b.register_rest_with_meta(recipes::MODULE_NAME, recipes);

    Ok(b.build_topo_sorted()?)
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");

    let db = Arc::new(connect_db(&config, &args).await?);
    let hub = Arc::new(ClientHub::new());
    hub.register::<JwtKeys>(jwt_keys(&config)?);

    let run_options = RunOptions {
        home_dir: Some(config.home_dir()),
        modules_cfg: Arc::new(AppConfigProvider::new(config)),
        db: DbOptions::Existing(db),
        registry: build_registry()?,
        client_hub: Some(hub),
        shutdown: ShutdownOptions::Signals,
    };

    run(run_options).await
}

fn check_config(config: AppConfig, args: &CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    if !args.mock {
        let db = config
            .database
            .as_ref()
            .ok_or_else(|| anyhow!("Database URL not configured"))?;
        let backend = detect_from_dsn(db)?;
        tracing::info!(backend, "database configuration recognized");
    }
    jwt_keys(&config)?;
    build_registry()?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}

/// Runs init and migrations only, then creates the account through `UsersApi`.
async fn create_superuser(
    config: AppConfig,
    args: CliArgs,
    email: &str,
    password: &str,
) -> Result<()> {
    let db = Arc::new(connect_db(&config, &args).await?);
    let hub = Arc::new(ClientHub::new());
    hub.register::<JwtKeys>(jwt_keys(&config)?);

    let registry = build_registry()?;
    let ctx = ModuleCtxBuilder::new(CancellationToken::new())
        .with_client_hub(hub.clone())
        .with_config_provider(Arc::new(AppConfigProvider::new(config.clone())))
        .with_db(db.clone())
        .with_home_dir(config.home_dir())
        .build();

    registry.run_init_phase(&ctx).await?;
    registry.run_db_phase(&db).await?;

    let users_api = hub.get::<dyn users::contract::client::UsersApi>()?;
    let user = users_api.create_superuser(email, password).await?;
    tracing::info!(user_id = %user.id, "superuser created");
    println!("Superuser created: {}", user.email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(port: Option<u16>) -> CliArgs {
        CliArgs {
            config: None,
            port,
            print_config: false,
            verbose: 0,
            mock: true,
        }
    }

    #[test]
    fn ingress_bind_addr_follows_server_section() {
        let mut config = AppConfig::default();
        config.server.host = "0.0.0.0".into();
        config.server.port = 9000;
        derive_ingress_config(&mut config, &args(None));
        assert_eq!(config.modules["api_ingress"]["bind_addr"], "0.0.0.0:9000");
    }

    #[test]
    fn explicit_bind_addr_is_kept_unless_port_flag() {
        let mut config = AppConfig::default();
        config.modules.insert(
            "api_ingress".into(),
            serde_json::json!({ "bind_addr": "127.0.0.1:7000" }),
        );
        derive_ingress_config(&mut config, &args(None));
        assert_eq!(config.modules["api_ingress"]["bind_addr"], "127.0.0.1:7000");

        config.server.port = 7100;
        derive_ingress_config(&mut config, &args(Some(7100)));
        assert_eq!(config.modules["api_ingress"]["bind_addr"], "127.0.0.1:7100");
    }

    #[test]
    fn dsn_backend_detection() {
        let db = |url: &str| DatabaseConfig {
            url: url.into(),
            max_conns: None,
            busy_timeout_ms: None,
        };
        assert_eq!(detect_from_dsn(&db("sqlite://database/r.db")).unwrap(), "sqlite");
        assert_eq!(detect_from_dsn(&db("sqlite::memory:")).unwrap(), "sqlite");
        assert_eq!(detect_from_dsn(&db("postgres://u:p@h/db")).unwrap(), "postgres");
        assert!(detect_from_dsn(&db("mysql://h/db")).is_err());
        assert!(detect_from_dsn(&db("")).is_err());
    }

    #[test]
    fn dsn_password_is_redacted() {
        assert_eq!(
            redact_dsn("postgres://app:hunter2@db/recipes"),
            "postgres://app:***@db/recipes"
        );
        assert_eq!(redact_dsn("sqlite::memory:"), "sqlite::memory:");
    }
}
