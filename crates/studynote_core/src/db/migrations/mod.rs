//! Versioned schema upgrades for the document database.
//!
//! # Responsibility
//! - List the schema steps this build knows, oldest first.
//! - Bring a connection from its stored version up to `latest_version()`.
//!
//! # Invariants
//! - Steps run inside one transaction; a failed step leaves the stored
//!   version untouched.
//! - The stored version lives in `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::{debug, error, info};
use rusqlite::{Connection, Transaction};
use std::time::Instant;

/// One schema step, identified by the version it produces.
#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "hierarchy",
        sql: include_str!("0001_hierarchy.sql"),
    },
    SchemaStep {
        version: 2,
        name: "board_todos",
        sql: include_str!("0002_board_todos.sql"),
    },
];

/// Schema version produced by the newest step in this build.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Schema version currently recorded on `conn`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Runs every step newer than the stored version.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the database is newer than this build.
/// - `MigrationFailed` naming the first step that did not apply.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = schema_version(conn)?;
    let to = latest_version();
    if from > to {
        error!(
            "event=db_migrate module=db status=error from={from} to={to} error_code=schema_too_new"
        );
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: to,
        });
    }

    let pending = pending_steps(from);
    if pending.is_empty() {
        return Ok(());
    }

    let started_at = Instant::now();
    info!("event=db_migrate module=db status=start from={from} to={to}");
    if let Err(err) = migrate_with(conn, pending) {
        error!(
            "event=db_migrate module=db status=error from={from} to={to} duration_ms={} error_code=db_migrate_failed error={err}",
            started_at.elapsed().as_millis()
        );
        return Err(err);
    }

    info!(
        "event=db_migrate module=db status=ok from={from} to={to} duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(())
}

fn pending_steps(from: u32) -> &'static [SchemaStep] {
    let first = SCHEMA_STEPS.partition_point(|step| step.version <= from);
    &SCHEMA_STEPS[first..]
}

fn migrate_with(conn: &mut Connection, steps: &[SchemaStep]) -> DbResult<()> {
    let tx = conn.transaction()?;
    for step in steps {
        run_step(&tx, step).map_err(|source| DbError::MigrationFailed {
            version: step.version,
            source,
        })?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;
    Ok(())
}

fn run_step(tx: &Transaction<'_>, step: &SchemaStep) -> rusqlite::Result<()> {
    tx.execute_batch(step.sql)?;
    tx.pragma_update(None, "user_version", step.version)
}

#[cfg(test)]
mod tests {
    use super::{latest_version, pending_steps, SCHEMA_STEPS};

    #[test]
    fn steps_are_strictly_increasing() {
        assert!(SCHEMA_STEPS
            .windows(2)
            .all(|pair| pair[0].version < pair[1].version));
        assert_eq!(latest_version(), 2);
    }

    #[test]
    fn pending_steps_skip_applied_versions() {
        let versions = |from| {
            pending_steps(from)
                .iter()
                .map(|step| step.version)
                .collect::<Vec<_>>()
        };
        assert_eq!(versions(0), vec![1, 2]);
        assert_eq!(versions(1), vec![2]);
        assert!(versions(latest_version()).is_empty());
    }
}
