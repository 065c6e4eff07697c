// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use std::time::Duration;

use clap::Parser;
use cli::{Cli, Commands, DbArgs};
use helpdesk_core::registry::dept::create_dept;
use helpdesk_core::session::queries::{purge_expired_sessions, set_admin_for_user};
use helpdesk_core::{Database, StoreConfig};

mod cli;
mod logging;

fn main() -> Result<()> {
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(e.exit_code());
    }
    Ok(())
}

fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init()?;

    let args = Cli::parse();

    match args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        command => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(execute(command))?;
        }
    }

    Ok(())
}

async fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Version => {}
        Commands::Migrate(db) => {
            let db = connect(&db).await?;
            db.migrate().await?;
            db.close().await;
        }
        Commands::Verify(db) => {
            let db = connect(&db).await?;
            db.verify_constraints().await?;
            db.close().await;
        }
        Commands::Promote { user_id, db } => set_admin(&db, &user_id, true).await?,
        Commands::Demote { user_id, db } => set_admin(&db, &user_id, false).await?,
        Commands::CreateDept { name, db } => {
            let db = connect(&db).await?;
            let dept_id = create_dept(db.pool(), &name).await?;
            println!("{dept_id}");
            db.close().await;
        }
        Commands::PurgeSessions(db) => {
            let db = connect(&db).await?;
            let purged = purge_expired_sessions(db.pool()).await?;
            log::info!(
                "purged {} pending and {} active sessions",
                purged.pending,
                purged.active
            );
            db.close().await;
        }
    }
    Ok(())
}

async fn connect(args: &DbArgs) -> Result<Database> {
    let config = StoreConfig {
        database_url: args.database_url.clone(),
        max_connections: args.max_connections,
        acquire_timeout: Duration::from_secs(args.acquire_timeout_secs),
        ..StoreConfig::from_env()
    };
    Ok(Database::connect(config).await?)
}

async fn set_admin(args: &DbArgs, user_id: &str, admin: bool) -> Result<()> {
    let db = connect(args).await?;
    let previous = set_admin_for_user(db.pool(), user_id, admin).await?;
    db.close().await;

    match previous {
        None => Err(Error::Custom(format!("no such user: {user_id}"))),
        Some(previous) => {
            log::info!("admin flag for {user_id}: {previous} -> {admin}");
            Ok(())
        }
    }
}
