//! Shared access to one session from several tasks.
//!
//! The controller cannot tell interleaved requests apart, so the lock is held
//! for each full request/response exchange. Batches lock per command, which
//! lets other callers slip in between commands but never inside one.

use crate::error::Wr3223Error;
use crate::registry;
use crate::wr3223::frame::ResponseFrame;
use crate::wr3223::serial::{record, QueryResult, SerialPort, Wr3223Session};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Cloneable handle serializing transactions on one session.
pub struct SharedSession<P = tokio_serial::SerialStream> {
    inner: Arc<Mutex<Wr3223Session<P>>>,
}

impl<P> Clone for SharedSession<P> {
    fn clone(&self) -> Self {
        SharedSession {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: SerialPort> SharedSession<P> {
    pub fn new(session: Wr3223Session<P>) -> Self {
        SharedSession {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.lock().await.is_connected()
    }

    pub async fn disconnect(&self) -> Result<(), Wr3223Error> {
        self.inner.lock().await.disconnect().await
    }

    pub async fn read_one(&self, code: &str) -> Result<String, Wr3223Error> {
        self.inner.lock().await.read_one(code).await
    }

    pub async fn read_frame(&self, code: &str) -> Result<ResponseFrame, Wr3223Error> {
        self.inner.lock().await.read_frame(code).await
    }

    /// Same contract as [`Wr3223Session::read_many`], one lock per command.
    pub async fn read_many<I, S>(&self, codes: I) -> QueryResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut results = QueryResult::new();
        for code in codes {
            let code = code.as_ref();
            let outcome = self.read_one(code).await;
            record(&mut results, code, outcome);
        }
        results
    }

    pub async fn read_all(&self) -> QueryResult {
        self.read_many(registry::all_codes().iter().copied()).await
    }
}
