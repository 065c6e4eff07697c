use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "helpdesk", about = "Helpdesk operator tools", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the version.
    Version,

    /// Apply pending schema migrations.
    Migrate(DbArgs),

    /// Check that every constraint the data layer translates exists in the schema.
    Verify(DbArgs),

    /// Grant administrator rights to a user.
    Promote {
        /// Identity-provider subject id of the user.
        user_id: String,
        #[command(flatten)]
        db: DbArgs,
    },

    /// Revoke administrator rights from a user.
    Demote {
        user_id: String,
        #[command(flatten)]
        db: DbArgs,
    },

    /// Create a department and print its id.
    CreateDept {
        name: String,
        #[command(flatten)]
        db: DbArgs,
    },

    /// Delete expired pending and active sessions.
    PurgeSessions(DbArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DbArgs {
    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/helpdesk"
    )]
    pub database_url: String,

    /// Maximum number of pooled connections.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// Seconds to wait for a connection before giving up.
    #[arg(long, env = "DATABASE_ACQUIRE_TIMEOUT_SECS", default_value_t = 30)]
    pub acquire_timeout_secs: u64,
}
