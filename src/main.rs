use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ministry_data::utils::{logger, validation::Validate};
use ministry_data::*;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "ministry-data")]
#[command(about = "Inspect and maintain ministry records on the configured backend")]
struct Args {
    /// Path to TOML configuration file (defaults to environment variables)
    #[arg(short, long)]
    config: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Connect to the remote backend with the service-role key
    #[arg(long)]
    service_role: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show which backend is in use
    Status,
    /// Print one record
    Get { table: Table, id: String },
    /// Print matching records
    List {
        table: Table,
        #[arg(long)]
        search: Option<String>,
        /// Equality filter, repeatable (e.g. --filter is_active=true)
        #[arg(long = "filter", value_name = "COLUMN=VALUE")]
        filters: Vec<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        offset: Option<usize>,
    },
    /// Delete one record
    Delete { table: Table, id: String },
    /// Print change events until interrupted
    Watch {
        table: Table,
        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },
}

/// Binds `$E` to the entity type stored in `$table` and evaluates `$body`.
macro_rules! with_entity {
    ($table:expr, $E:ident => $body:expr) => {
        match $table {
            Table::Households => { type $E = Household; $body }
            Table::Guardians => { type $E = Guardian; $body }
            Table::Children => { type $E = Child; $body }
            Table::Ministries => { type $E = Ministry; $body }
            Table::MinistryEnrollments => { type $E = MinistryEnrollment; $body }
            Table::RegistrationCycles => { type $E = RegistrationCycle; $body }
            Table::Attendance => { type $E = Attendance; $body }
            Table::Incidents => { type $E = Incident; $body }
            Table::BibleBeeCycles => { type $E = BibleBeeCycle; $body }
            Table::Divisions => { type $E = Division; $body }
            Table::Scriptures => { type $E = Scripture; $body }
            Table::StudentScriptures => { type $E = StudentScripture; $body }
            Table::EssayPrompts => { type $E = EssayPrompt; $body }
            Table::StudentEssays => { type $E = StudentEssay; $body }
            Table::Users => { type $E = User; $body }
            Table::BrandingSettings => { type $E = BrandingSettings; $body }
        }
    };
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    let config = match &args.config {
        Some(path) => AdapterConfig::from_file(path)
            .with_context(|| format!("failed to load config file '{}'", path))?,
        None => AdapterConfig::from_env(),
    };
    config.validate().context("configuration validation failed")?;

    let adapter = if args.service_role {
        let key = config
            .remote_service_role_key()
            .context("--service-role needs a service-role key")?;
        let settings = config
            .remote_settings(key)
            .context("--service-role needs a remote url")?;
        Adapter::Remote(RemoteAdapter::new(settings, Arc::new(TracingSink))?)
    } else {
        create_adapter(&config, Arc::new(TracingSink)).await
    };

    run(&adapter, &config, args.command).await
}

async fn run(adapter: &Adapter, config: &AdapterConfig, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Status => {
            println!("backend: {}", adapter.backend());
            println!("configured mode: {:?}", config.mode);
            match adapter {
                Adapter::Local(local) => {
                    let store = local.store();
                    match store.path() {
                        Some(path) => println!("store: {} (schema v{})", path.display(), store.version()),
                        None => println!("store: in memory (schema v{})", store.version()),
                    }
                    for table in Table::ALL {
                        println!("  {:<22} {}", table.as_str(), store.len(table).await);
                    }
                }
                Adapter::Remote(_) => {
                    println!("remote: {}", config.remote_url().unwrap_or_default());
                }
            }
        }
        Command::Get { table, id } => {
            let record = with_entity!(table, E => {
                adapter.get::<E>(&id).await?.map(serde_json::to_value).transpose()?
            });
            match record {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => bail!("{} {} not found", table, id),
            }
        }
        Command::List {
            table,
            search,
            filters,
            limit,
            offset,
        } => {
            let mut filter = ListFilter::new();
            if let Some(search) = search {
                filter = filter.search(search);
            }
            for pair in filters {
                let (column, value) = parse_filter(&pair)?;
                filter = filter.eq(column, value);
            }
            if let Some(limit) = limit {
                filter = filter.limit(limit);
            }
            if let Some(offset) = offset {
                filter = filter.offset(offset);
            }

            let records = with_entity!(table, E => {
                serde_json::to_value(adapter.list::<E>(&filter).await?)?
            });
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::Delete { table, id } => {
            with_entity!(table, E => adapter.delete::<E>(&id).await?);
            println!("deleted {} {}", table, id);
        }
        Command::Watch { table, seconds } => {
            let subscription = adapter
                .subscribe_to_table(
                    table.as_str(),
                    Arc::new(|event: ChangeEvent| match serde_json::to_string(&event) {
                        Ok(line) => println!("{}", line),
                        Err(e) => tracing::warn!(error = %e, "could not serialize change event"),
                    }),
                )
                .await?;
            if adapter.is_local() {
                tracing::info!("local backend has no change feed, nothing will be printed");
            }

            match seconds {
                Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
                None => tokio::signal::ctrl_c().await?,
            }
            subscription.unsubscribe();
        }
    }
    Ok(())
}

/// `column=value`, where the value is read as JSON when it parses and as text otherwise.
fn parse_filter(pair: &str) -> anyhow::Result<(String, Value)> {
    let Some((column, raw)) = pair.split_once('=') else {
        bail!("filter '{}' is not COLUMN=VALUE", pair);
    };
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((column.trim().to_string(), value))
}
