//! Bolt CLI - Main entry point for CLI binary
//!
//! This binary provides the `bolt` tool for initializing, inspecting and serving a broker project.

use bolt_lib::engine::{
    adapter::{RelationalBackend, SqliteAdapter},
    api::{create_router, ApiState},
    cli::{formatter::{format_table_list, CliFormatter}, Cli, Commands, OutputFormat},
    config::{Config, CONFIG_FILE},
    query::translate_structured_query,
    widecolumn::{TableStore, WideColumnBackend},
};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run_cli(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let project_dir = cli.get_project_dir();
    let json_output = cli.format == OutputFormat::Json;

    match cli.command {
        Commands::Init { force } => {
            cmd_init(&project_dir, force, json_output)?;
        }
        Commands::Serve { port, host } => {
            cmd_serve(&project_dir, host, port)?;
        }
        Commands::Translate { file } => {
            cmd_translate(&file, json_output)?;
        }
        Commands::Tables => {
            cmd_tables(&project_dir, json_output)?;
        }
    }

    Ok(())
}

fn open_backends(
    project_dir: &Path,
    config: &Config,
) -> Result<(SqliteAdapter, TableStore), Box<dyn std::error::Error>> {
    let db_path = config.resolve(project_dir, &config.relational.path);
    let relational = SqliteAdapter::new(&db_path)?.with_key_columns(
        &config.relational.partition_key_column,
        &config.relational.row_key_column,
    );

    let store_path = config.resolve(project_dir, &config.wide_column.path);
    let wide_column = TableStore::open_or_create(&store_path)?;

    Ok((relational, wide_column))
}

fn cmd_init(
    project_dir: &PathBuf,
    force: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if project_dir.join(CONFIG_FILE).exists() && !force {
        return Err(format!(
            "{} already exists in {} (use --force)",
            CONFIG_FILE,
            project_dir.display()
        )
        .into());
    }

    std::fs::create_dir_all(project_dir)?;
    let config = Config::default_for_project();
    config.save(project_dir)?;

    let (relational, _) = open_backends(project_dir, &config)?;

    if json {
        println!("{}", serde_json::json!({
            "success": true,
            "config": project_dir.join(CONFIG_FILE),
            "relational": relational.db_path(),
            "wide_column": config.resolve(project_dir, &config.wide_column.path),
        }));
    } else {
        CliFormatter::success("Bolt project initialized");
        CliFormatter::kv("Config", &project_dir.join(CONFIG_FILE).display().to_string());
        CliFormatter::kv("Relational", &relational.db_path().display().to_string());
        CliFormatter::kv(
            "Wide-column",
            &config.resolve(project_dir, &config.wide_column.path).display().to_string(),
        );
        CliFormatter::info("Run `bolt serve` to start the broker");
    }

    Ok(())
}

#[tokio::main]
async fn cmd_serve(
    project_dir: &PathBuf,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(project_dir)?;
    let (relational, wide_column) = open_backends(project_dir, &config)?;

    let state = ApiState {
        relational: Arc::new(relational),
        wide_column: Arc::new(wide_column),
    };
    let app = create_router(state);

    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", host, port);

    CliFormatter::header("Bolt Query Broker");
    CliFormatter::kv("Project", &project_dir.display().to_string());
    CliFormatter::kv("Listening", &format!("http://{}", addr));
    CliFormatter::info("Press Ctrl+C to stop");
    tracing::info!("serving on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cmd_translate(file: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(file)?;
    let document: serde_json::Value = serde_json::from_str(&content)?;
    let spec = translate_structured_query(&document)?;
    let sql = spec.to_sql();

    if json {
        println!("{}", serde_json::json!({ "sql": sql, "query": spec }));
    } else {
        CliFormatter::header("Translated query");
        CliFormatter::code_block(&sql, "sql");
        if spec.limit.is_none() && spec.offset.is_none() && document.get("Offset").is_some() {
            CliFormatter::warning("Offset without Limit is ignored");
        }
    }

    Ok(())
}

fn cmd_tables(project_dir: &PathBuf, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(project_dir)?;
    let (relational, wide_column) = open_backends(project_dir, &config)?;

    let relational_tables = relational.list_tables()?;
    let wide_column_tables = wide_column.list_tables()?;

    if json {
        println!("{}", serde_json::json!({
            "relational": relational_tables,
            "wide_column": wide_column_tables,
        }));
    } else {
        CliFormatter::header("Tables");
        CliFormatter::kv("Relational", &format_table_list(&relational_tables));
        CliFormatter::kv("Wide-column", &format_table_list(&wide_column_tables));
    }

    Ok(())
}
