use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::handlers::SchedulePolicy;

/// Settings for the HTTP server, read once at startup from flags, the
/// environment and a `.env` file in the working directory.
#[derive(Debug, Clone, Parser)]
#[command(name = "artschool-admin", version, about = "Art school administration API")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Upper bound on pooled database connections
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// Seconds to wait for a free pooled connection
    #[arg(long, env = "DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,

    /// Accept schedules created without any classes
    #[arg(long, env = "ALLOW_EMPTY_SCHEDULES")]
    pub allow_empty_schedules: bool,
}

impl ServerConfig {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn schedule_policy(&self) -> SchedulePolicy {
        SchedulePolicy {
            allow_empty: self.allow_empty_schedules,
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "artschool-migrate",
    version,
    about = "Migration CLI for Artschool Admin",
    long_about = "Applies the versioned Postgres migrations for Artschool Admin"
)]
pub struct MigrateConfig {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Directory holding `<version>_<description>.sql` files
    #[arg(long, env = "MIGRATIONS_DIR", default_value = "migrations")]
    pub migrations: PathBuf,

    #[command(subcommand)]
    pub command: MigrateCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum MigrateCommand {
    /// Apply all pending migrations
    Up,
    /// Print the current schema version
    Version,
}

impl MigrateConfig {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }
}
