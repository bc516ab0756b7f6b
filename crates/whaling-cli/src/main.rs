use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(name = "whaling")]
#[command(about = "Whaling promotion tracker CLI", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (base -> env -> local)
    #[arg(long = "config", global = true, default_value = "config/whaling.yaml")]
    config_paths: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Select due accounts and write refresh batches to the outbox
    Schedule {
        /// Ignore the interval and dispatch every active account
        #[arg(long, default_value_t = false)]
        all: bool,
    },

    /// Process refresh batches
    Refresh {
        /// A single batch payload file
        #[arg(long = "payload-file", conflicts_with = "outbox")]
        payload_file: Option<String>,

        /// Drain every pending batch in the outbox directory
        #[arg(long, default_value_t = false)]
        outbox: bool,

        #[arg(long = "events", value_enum, default_value_t = EventTarget::Jsonl)]
        events: EventTarget,
    },

    /// Run the scheduler and worker in one process until Ctrl-C
    Serve {
        #[arg(long = "events", value_enum, default_value_t = EventTarget::Jsonl)]
        events: EventTarget,
    },

    /// Register an account after a successful login
    Enroll {
        #[arg(long)]
        account: String,

        /// eu | com | ru | asia
        #[arg(long)]
        realm: String,

        #[arg(long)]
        token: String,

        /// Credential expiry (unix seconds)
        #[arg(long = "expires-at")]
        expires_at: i64,
    },

    /// Owner-requested refresh of one account
    RequestRefresh {
        #[arg(long)]
        account: String,
    },

    /// Mark a tracked ship as played and credit its reward
    Credit {
        #[arg(long)]
        account: String,

        #[arg(long)]
        ship: i64,
    },

    /// Compute promotion-wide totals and write statistics.json
    GlobalStats,
}

#[derive(Subcommand)]
enum DbCmd {
    Status,

    /// Apply SQL migrations
    Migrate,
}

/// Where domain events go.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EventTarget {
    Jsonl,
    Db,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // dev-time secrets (application id, database url); absent in production
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();
    let config_paths = cli.config_paths;

    match cli.cmd {
        Commands::Db { cmd } => {
            let pool = whaling_db::connect_from_env().await?;
            match cmd {
                DbCmd::Status => {
                    let s = whaling_db::status(&pool).await?;
                    println!("db_ok={} has_accounts_table={}", s.ok, s.has_accounts_table);
                }
                DbCmd::Migrate => {
                    whaling_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = whaling_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Schedule { all } => {
            commands::pipeline::schedule(&config_paths, all).await?;
        }

        Commands::Refresh {
            payload_file,
            outbox,
            events,
        } => {
            let db_events = events == EventTarget::Db;
            commands::pipeline::refresh(&config_paths, payload_file, outbox, db_events).await?;
        }

        Commands::Serve { events } => {
            commands::pipeline::serve(&config_paths, events == EventTarget::Db).await?;
        }

        Commands::Enroll {
            account,
            realm,
            token,
            expires_at,
        } => {
            commands::accounts::enroll(&config_paths, account, &realm, token, expires_at).await?;
        }

        Commands::RequestRefresh { account } => {
            commands::accounts::request_refresh(&config_paths, &account).await?;
        }

        Commands::Credit { account, ship } => {
            commands::accounts::credit(&config_paths, &account, ship).await?;
        }

        Commands::GlobalStats => {
            commands::accounts::global_stats(&config_paths).await?;
        }
    }

    Ok(())
}
