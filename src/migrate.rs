use std::path::Path;

use sqlx::migrate::Migrator;
use sqlx::PgPool;

use crate::err::Error;

/// Versioned migrations loaded from a directory of
/// `<version>_<description>.sql` files.
pub struct MigrationRunner {
    migrator: Migrator,
}

impl MigrationRunner {
    pub async fn load(dir: &Path) -> Result<Self, Error> {
        let migrator = Migrator::new(dir).await?;
        Ok(Self { migrator })
    }

    /// `(version, description)` of every migration found, oldest first.
    pub fn available(&self) -> Vec<(i64, String)> {
        self.migrator
            .iter()
            .map(|m| (m.version, m.description.to_string()))
            .collect()
    }

    /// Applies everything not applied yet and returns the resulting version.
    /// Having nothing to apply is not an error.
    pub async fn apply_pending(&self, pool: &PgPool) -> Result<Option<i64>, Error> {
        let before = current_version(pool).await?;
        self.migrator.run(pool).await?;
        let after = current_version(pool).await?;

        if before == after {
            log::info!("No pending migrations");
        } else {
            log::info!("Migrated schema from {:?} to {:?}", before, after);
        }
        Ok(after)
    }
}

/// Highest successfully applied migration, `None` on a fresh database.
pub async fn current_version(pool: &PgPool) -> Result<Option<i64>, Error> {
    let tracked = sqlx::query_scalar::<_, bool>("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
        .fetch_one(pool)
        .await
        .map_err(Error::from)?;
    if !tracked {
        return Ok(None);
    }

    let version = sqlx::query_scalar::<_, Option<i64>>(
        "SELECT MAX(version) FROM _sqlx_migrations WHERE success",
    )
    .fetch_one(pool)
    .await
    .map_err(Error::from)?;
    Ok(version)
}
