//! Session Guard - scoped ownership of one engine connection
//!
//! A `Session` is acquired with [`Session::open`] and released with
//! [`Session::close`] or [`Session::finish`]. `finish` is the usual exit:
//! it takes the outcome of the work done on the session, closes the
//! connection whatever that outcome was, and hands the outcome back.
//!
//! ```rust,no_run
//! use engine::{DataFusionDatabase, Session};
//!
//! # async fn example() -> Result<(), engine::EngineError> {
//! let db = DataFusionDatabase::new();
//! let mut session = Session::open(&db).await?;
//! let result = session.query("SELECT 1").await;
//! let batches = session.finish(result).await?;
//! # Ok(())
//! # }
//! ```

use crate::{Connection, Database, EngineError, Result, TableContent};
use arrow::record_batch::RecordBatch;
use diagnostics::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

pub struct Session {
    /// None once the connection has been released
    conn: Option<Box<dyn Connection>>,
    id: u64,
    started: Instant,
    queries: usize,
}

impl Session {
    /// Acquire a new connection from `db`
    pub async fn open(db: &dyn Database) -> Result<Self> {
        let conn = db.connect().await?;
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        debug!("Opened session {id}", id: id);
        Ok(Self {
            conn: Some(conn),
            id,
            started: Instant::now(),
            queries: 0,
        })
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Number of queries issued through this session so far
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries
    }

    fn conn(&mut self) -> Result<&mut Box<dyn Connection>> {
        self.conn.as_mut().ok_or(EngineError::ConnectionClosed)
    }

    pub async fn register_table(&mut self, name: &str, content: TableContent) -> Result<()> {
        self.conn()?.register_table(name, content).await
    }

    pub async fn query(&mut self, sql: &str) -> Result<Vec<RecordBatch>> {
        let batches = self.conn()?.query(sql).await?;
        self.queries += 1;
        Ok(batches)
    }

    /// Release the connection
    pub async fn close(mut self) -> Result<()> {
        self.release().await
    }

    /// Release the connection and return `result`.
    ///
    /// A failure to close is reported only when `result` itself is `Ok`;
    /// otherwise the original error wins and the close failure is logged.
    pub async fn finish<T, E>(mut self, result: std::result::Result<T, E>) -> std::result::Result<T, E>
    where
        E: From<EngineError>,
    {
        let closed = self.release().await;
        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(close_err)) => Err(close_err.into()),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                let id = self.id;
                let close_err = close_err.to_string();
                warn!(
                    "Session {id} failed to close after an error: {close_err}",
                    id: id,
                    close_err: &close_err
                );
                Err(err)
            }
        }
    }

    async fn release(&mut self) -> Result<()> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };
        let id = self.id;
        let queries = self.queries;
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        debug!(
            "Closing session {id} after {queries} queries in {elapsed_ms}ms",
            id: id,
            queries: queries,
            elapsed_ms: elapsed_ms
        );
        conn.close().await
    }
}

impl Drop for Session {
    /// Sessions that were never closed (a panic, or a forgotten `finish`)
    /// still drop their connection here; the connection's own drop releases it.
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            let id = self.id;
            warn!("Session {id} dropped without close - releasing connection", id: id);
            drop(conn);
        }
    }
}
