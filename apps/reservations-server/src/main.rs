use anyhow::{anyhow, Context, Result};
use axum::{middleware::from_fn, Router};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use reservations::{config::ReservationsConfig, Reservations};
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};
use url::Url;

mod request_id;
mod shutdown;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MODULE_NAME: &str = "reservations";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
/// - Adds `mode=rwc` so a missing database file gets created.
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
    {
        return Ok("sqlite::memory:".to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    out.push('?');
    match query {
        Some(q) if q.contains("mode=") => out.push_str(q),
        Some(q) => {
            out.push_str(q);
            out.push_str("&mode=rwc");
        }
        None => out.push_str("mode=rwc"),
    }
    Ok(out)
}

/// Room reservation server
#[derive(Parser)]
#[command(name = "reservations-server")]
#[command(about = "Room reservation server: reservation lifecycle, approvals and notifications")]
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

    // home_dir is normalized and created while loading
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Reservations server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config, args),
    }
}

/// Detect DB backend from URL scheme.
fn detect_from_dsn(cfg: &DatabaseConfig) -> Result<&'static str> {
    let raw = cfg.url.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }

    let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;

    match url.scheme() {
        "sqlite" | "sqlite3" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

fn bind_addr(config: &AppConfig) -> Result<SocketAddr> {
    let raw = format!("{}:{}", config.server.host, config.server.port);
    raw.parse()
        .map_err(|e| anyhow!("Invalid bind address '{}': {}", raw, e))
}

fn module_config(config: &AppConfig) -> Result<ReservationsConfig> {
    config.module_config::<ReservationsConfig>(MODULE_NAME)
}

async fn connect(config: &AppConfig, args: &CliArgs) -> Result<DatabaseConnection> {
    let base_dir = PathBuf::from(&config.server.home_dir);

    let (dsn, max_conns, acquire_ms) = match (&config.database, args.mock) {
        (_, true) => ("sqlite::memory:".to_string(), Some(1), None),
        (Some(db), false) => {
            detect_from_dsn(db)?;
            let mut dsn = db.url.trim().to_owned();
            // Absolutize sqlite DSNs to avoid cwd issues
            if dsn.starts_with("sqlite://") {
                dsn = absolutize_sqlite_dsn(&dsn, &base_dir, true)?;
            }
            (dsn, db.max_conns, db.acquire_timeout_ms)
        }
        (None, false) => {
            tracing::warn!("No database configuration found, using in-memory SQLite");
            ("sqlite::memory:".to_string(), Some(1), None)
        }
    };

    // Every pooled connection to sqlite::memory: would see its own database.
    let max_conns = if dsn == "sqlite::memory:" {
        1
    } else {
        max_conns.unwrap_or(10)
    };

    let mut opts = ConnectOptions::new(dsn.clone());
    opts.max_connections(max_conns)
        .acquire_timeout(Duration::from_millis(acquire_ms.unwrap_or(5000)))
        .sqlx_logging(false);

    tracing::info!("Connecting to database: {}", dsn);
    let db = Database::connect(opts)
        .await
        .with_context(|| format!("Failed to connect to database '{dsn}'"))?;
    tracing::info!("Connected DB backend: {:?}", db.get_database_backend());
    Ok(db)
}

/// Middleware order, outermost first:
/// PropagateRequestId -> SetRequestId -> push_req_id_to_extensions -> Trace -> Timeout -> BodyLimit
fn build_router(module: &Reservations, timeout_sec: u64) -> Router {
    let x_request_id = request_id::header();
    let mut router = module.router();

    router = router.layer(RequestBodyLimitLayer::new(1024 * 1024));
    if timeout_sec > 0 {
        router = router.layer(TimeoutLayer::new(Duration::from_secs(timeout_sec)));
    }
    router
        .layer(request_id::create_trace_layer())
        .layer(from_fn(request_id::push_req_id_to_extensions))
        .layer(SetRequestIdLayer::new(
            x_request_id.clone(),
            request_id::MakeReqId,
        ))
        .layer(PropagateRequestIdLayer::new(x_request_id))
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing reservations module...");

    let addr = bind_addr(&config)?;
    let module_cfg = module_config(&config)?;

    let db = connect(&config, &args).await?;
    Reservations::migrate(&db).await?;
    let module = Reservations::init(db, module_cfg).await?;

    let router = build_router(&module, config.server.timeout_sec);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = shutdown::wait_for_shutdown().await {
                tracing::warn!(error = %e, "Signal listener failed; shutting down");
            }
            cancel.cancel();
        });
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("HTTP server bound on {}", listener.local_addr()?);

    let shutdown = async move {
        cancel.cancelled().await;
        tracing::info!("HTTP server shutting down gracefully");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow!(e))
}

fn check_config(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    bind_addr(&config)?;
    if !args.mock {
        if let Some(db) = &config.database {
            let backend = detect_from_dsn(db)?;
            tracing::info!("Database backend: {}", backend);
        }
    }
    let module_cfg = module_config(&config)?;
    if let Some(n) = &module_cfg.notifications {
        Url::parse(&n.endpoint)
            .with_context(|| format!("invalid notifications.endpoint '{}'", n.endpoint))?;
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
