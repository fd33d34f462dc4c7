use std::sync::Arc;

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use tokio::sync::watch;

use super::connection::{Database, Generations, Table};

type QueryFn<T> = Arc<dyn Fn(&mut Connection) -> Result<T> + Send + Sync + 'static>;

/// A query whose result is re-delivered whenever the tables it reads change.
///
/// The first call to [`LiveQuery::next`] resolves with the current result.
/// Later calls wait until a write touches one of the watched tables, re-run
/// the query, and resolve only if the result differs from the previous one.
pub struct LiveQuery<T> {
    db: Database,
    query: QueryFn<T>,
    tables: Vec<Table>,
    changes: watch::Receiver<Generations>,
    seen: Generations,
    last: Option<T>,
}

impl<T> LiveQuery<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    pub(crate) fn new<F>(db: Database, tables: &[Table], query: F) -> Self
    where
        F: Fn(&mut Connection) -> Result<T> + Send + Sync + 'static,
    {
        let changes = db.subscribe_changes();
        let seen = *changes.borrow();

        Self {
            db,
            query: Arc::new(query),
            tables: tables.to_vec(),
            changes,
            seen,
            last: None,
        }
    }

    pub async fn next(&mut self) -> Result<T> {
        loop {
            if self.last.is_some() {
                self.wait_for_change().await?;
            }

            let query = Arc::clone(&self.query);
            let result = self.db.execute(move |conn| query(conn)).await?;

            if self.last.as_ref() != Some(&result) {
                self.last = Some(result.clone());
                return Ok(result);
            }
        }
    }

    /// Most recently delivered result, if any.
    pub fn latest(&self) -> Option<&T> {
        self.last.as_ref()
    }

    async fn wait_for_change(&mut self) -> Result<()> {
        loop {
            self.changes
                .changed()
                .await
                .map_err(|_| anyhow!("database closed while watching query"))?;

            let current = *self.changes.borrow_and_update();
            let touched = self
                .tables
                .iter()
                .any(|table| current.get(*table) != self.seen.get(*table));
            self.seen = current;

            if touched {
                return Ok(());
            }
        }
    }
}
