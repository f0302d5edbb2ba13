use artschool_admin::config::{MigrateCommand, MigrateConfig};
use artschool_admin::migrate::{current_version, MigrationRunner};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = MigrateConfig::load();

    if let Err(err) = run(config).await {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run(config: MigrateConfig) -> anyhow::Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await
        .map_err(|err| anyhow::anyhow!("Failed to connect to the database: {}", err))?;

    let version = match config.command {
        MigrateCommand::Up => {
            let runner = MigrationRunner::load(&config.migrations).await?;
            log::info!(
                "Found {} migrations in {}",
                runner.available().len(),
                config.migrations.display()
            );
            runner.apply_pending(&pool).await?
        }
        MigrateCommand::Version => current_version(&pool).await?,
    };
    pool.close().await;

    match (config.command, version) {
        (MigrateCommand::Up, Some(v)) => {
            println!("Migrations applied successfully. Current version is {}", v)
        }
        (MigrateCommand::Up, None) => println!("No migrations to apply"),
        (MigrateCommand::Version, Some(v)) => println!("{}", v),
        (MigrateCommand::Version, None) => println!("No migrations applied"),
    }
    Ok(())
}
