// Main entry point
use clap::Parser;
use colored::Colorize;
use docmap::domain::document::Document;
use docmap::infrastructure::config::{self, load_config};
use docmap::infrastructure::logging::init_logging;
use docmap::infrastructure::storage::db::SqliteDriver;
use docmap::infrastructure::storage::memory::MemoryDriver;
use docmap::interfaces::cli::{Cli, Command};
use docmap::presentation::render::format_instances;
use docmap::presentation::theme::Theme;
use docmap::state::AppState;
use docmap::{Criteria, DocError, Driver, Instance};
use serde_json::Value;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup graceful shutdown handler
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    // Spawn signal handler task
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("Failed to listen for shutdown signal: {}", e);
        } else {
            eprintln!("\nInterrupted, shutting down...");
            let _ = shutdown_tx.send(());
        }
    });

    let cli = Cli::parse();
    let config = load_config()?;

    // Initialize logging
    if config.logging.enable {
        init_logging(&config.logging)?;
    }

    if matches!(cli.command, Command::GenerateConfig) {
        config::generate_config_sample()?;
        return Ok(());
    }

    let driver: Arc<dyn Driver> = if cli.memory {
        Arc::new(MemoryDriver::new())
    } else {
        // Setup database path (from config or default)
        let db_path = config::get_database_path(&config);
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Arc::new(SqliteDriver::open(&db_path).await?)
    };

    let theme_name = cli.theme.clone().unwrap_or_else(|| config.theme.clone());
    let theme = Theme::from_name(&theme_name);
    let state = AppState::new(driver, config)?;

    if matches!(cli.command, Command::Status) {
        print_status(&state).await?;
        return Ok(());
    }

    // Each command is one request with its own query cache
    let request = state
        .middleware
        .call(cli.command, |command| run_command(&state, command, &theme));

    tokio::select! {
        result = request => {
            print!("{}", result?);
        }
        _ = shutdown_rx => {
            eprintln!("Operation interrupted");
        }
    }

    Ok(())
}

fn parse_object(raw: &str) -> Result<Document, DocError> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(DocError::InvalidQuery(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

async fn run_command(state: &AppState, command: Command, theme: &Theme) -> Result<String, DocError> {
    match command {
        Command::Insert { model, attributes } => {
            let config = state.registry.by_name(&model)?;
            let mut instance = Instance::new(config);
            for (name, value) in parse_object(&attributes)? {
                instance.write_attribute(&name, value)?;
            }
            state.executor.insert(&mut instance).await?;
            Ok(format!("Inserted {}\n", instance.inspect()))
        }
        Command::Find {
            model,
            filter,
            only,
            without,
            sort,
            limit,
            skip,
            json,
        } => {
            let config = state.registry.by_name(&model)?;
            let selector = match filter.as_deref() {
                Some(raw) => parse_object(raw)?,
                None => Document::new(),
            };

            let mut criteria = Criteria::with_selector(config.collection.clone(), selector)?;
            if !only.is_empty() {
                criteria = criteria.only(only.as_slice());
            }
            if !without.is_empty() {
                criteria = criteria.without(without.as_slice());
            }
            for key in sort {
                criteria = match key.strip_prefix('-') {
                    Some(field) => criteria.desc(field),
                    None => criteria.asc(key.clone()),
                };
            }
            if let Some(skip) = skip {
                criteria = criteria.skip(skip);
            }
            if let Some(limit) = limit {
                criteria = criteria.limit(limit);
            }

            let instances = state.executor.find_instances(&config, &criteria).await?;
            if json {
                let docs: Vec<&Document> = instances.iter().map(Instance::attributes).collect();
                Ok(format!("{}\n", serde_json::to_string_pretty(&docs)?))
            } else {
                Ok(format_instances(&instances, theme))
            }
        }
        Command::Update {
            model,
            filter,
            attributes,
        } => {
            let config = state.registry.by_name(&model)?;
            let criteria = Criteria::with_selector(config.collection.clone(), parse_object(&filter)?)?;
            let changes = parse_object(&attributes)?;

            let mut updated = 0;
            for mut instance in state.executor.find_instances(&config, &criteria).await? {
                for (name, value) in &changes {
                    instance.write_attribute(name, value.clone())?;
                }
                if state.executor.update(&mut instance).await? {
                    updated += 1;
                }
            }
            Ok(format!("Updated {} document(s)\n", updated))
        }
        Command::Delete { model, filter } => {
            let config = state.registry.by_name(&model)?;
            let criteria = Criteria::with_selector(config.collection.clone(), parse_object(&filter)?)?;
            let deleted = state
                .executor
                .delete_where(&criteria.collection, &criteria.selector)
                .await?;
            Ok(format!("Deleted {} document(s)\n", deleted))
        }
        Command::Status | Command::GenerateConfig => Ok(String::new()),
    }
}

async fn print_status(state: &AppState) -> anyhow::Result<()> {
    println!("{}", "docmap Status".green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = state.config.read().await;
    println!(
        "Driver: {} ({})",
        state.executor.driver().name(),
        config::get_database_path(&config).display()
    );
    println!(
        "Config: {}",
        config::get_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "Not found".to_string())
    );
    println!(
        "Query cache: {}",
        if state.middleware.is_enabled() {
            "enabled"
        } else {
            "disabled"
        }
    );
    drop(config);

    let names = state.registry.names();
    if names.is_empty() {
        println!("Models: none declared");
    }
    for name in names {
        let model = state.registry.by_name(&name)?;
        let count = state.executor.count(&model.collection).await?;
        let shard = if model.is_sharded() {
            format!(", shard key [{}]", model.shard_key.join(", "))
        } else {
            String::new()
        };
        println!(
            "Model {}: {} ({} documents{})",
            name.cyan(),
            model.collection,
            count,
            shard
        );
    }

    Ok(())
}
