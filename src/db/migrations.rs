use anyhow::{bail, Context, Result};
use log::warn;
use rusqlite::{Connection, Transaction};

pub(crate) const CURRENT_SCHEMA_VERSION: i32 = 1;

pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let mut version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;

    // No downgrade path exists; the stored rows are telemetry, so rebuild.
    if version > CURRENT_SCHEMA_VERSION {
        warn!(
            "database version ({}) is newer than supported schema ({}); rebuilding",
            version, CURRENT_SCHEMA_VERSION
        );
        drop_all_tables(conn).context("failed to wipe database for destructive migration")?;
        version = 0;
    }

    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;

    while version < CURRENT_SCHEMA_VERSION {
        let next_version = version + 1;
        apply_migration(&tx, next_version)
            .with_context(|| format!("migration to version {next_version} failed"))?;
        version = next_version;
    }

    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit migrations")?;

    Ok(())
}

fn apply_migration(tx: &Transaction<'_>, version: i32) -> Result<()> {
    match version {
        1 => {
            tx.execute_batch(include_str!("schemas/schema_v1.sql"))
                .context("failed to execute schema_v1.sql")?;
            Ok(())
        }
        _ => bail!("unknown migration target version: {version}"),
    }
}

fn drop_all_tables(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;

    let tables: Vec<String> = {
        let mut stmt = tx.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        names
    };

    for table in tables {
        tx.execute_batch(&format!("DROP TABLE IF EXISTS \"{table}\""))?;
    }

    tx.pragma_update(None, "user_version", 0)?;
    tx.commit()?;
    Ok(())
}
