//! `await`-able variants of the submission surface.
//!
//! Each method submits a task whose callback resolves a oneshot channel,
//! so async callers get the completion arguments without writing a
//! [`CallbackTarget`] themselves. Operation failure is still a
//! `success = false` payload, exactly as on the callback surface; `Err`
//! means the task could not be queued or the worker went away.

use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::callback::{Argument, Callback, CallbackTarget};
use crate::dispatch::SqlDispatcher;
use crate::error::SqlDispatchError;
use crate::results::MappedRow;
use crate::types::Value;

/// Borrowed async view of a [`SqlDispatcher`], obtained via
/// [`SqlDispatcher::as_async`].
pub struct AsyncApi<'a> {
    dispatcher: &'a SqlDispatcher,
}

impl SqlDispatcher {
    #[must_use]
    pub fn as_async(&self) -> AsyncApi<'_> {
        AsyncApi { dispatcher: self }
    }
}

struct OneshotTarget {
    slot: Mutex<Option<oneshot::Sender<Vec<Argument>>>>,
}

impl CallbackTarget for OneshotTarget {
    fn call(&self, _method: &str, args: Vec<Argument>) {
        let sender = match self.slot.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(sender) = sender {
            let _ = sender.send(args);
        }
    }
}

impl AsyncApi<'_> {
    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued or the
    /// worker goes away before completing it.
    pub async fn connect(&self) -> Result<bool, SqlDispatchError> {
        let args = self
            .request(|d, cb| d.connect_to_database(cb))
            .await?;
        Ok(success_of(&args))
    }

    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued or the
    /// worker goes away before completing it.
    pub async fn set_schema(&self, schema: &str) -> Result<bool, SqlDispatchError> {
        let args = self.request(|d, cb| d.set_schema(schema, cb)).await?;
        Ok(success_of(&args))
    }

    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued or the
    /// worker goes away before completing it.
    pub async fn execute(&self, query: &str) -> Result<bool, SqlDispatchError> {
        let args = self.request(|d, cb| d.execute_query(query, cb)).await?;
        Ok(success_of(&args))
    }

    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued or the
    /// worker goes away before completing it.
    pub async fn execute_prepared(
        &self,
        query: &str,
        params: Vec<Value>,
    ) -> Result<bool, SqlDispatchError> {
        let args = self
            .request(|d, cb| d.execute_prepared_query(query, params, cb))
            .await?;
        Ok(success_of(&args))
    }

    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued or the
    /// worker goes away before completing it.
    pub async fn execute_update(&self, query: &str) -> Result<(bool, u64), SqlDispatchError> {
        let args = self
            .request(|d, cb| d.execute_update_query(query, cb))
            .await?;
        Ok((success_of(&args), count_of(&args)))
    }

    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued or the
    /// worker goes away before completing it.
    pub async fn execute_prepared_update(
        &self,
        query: &str,
        params: Vec<Value>,
    ) -> Result<(bool, u64), SqlDispatchError> {
        let args = self
            .request(|d, cb| d.execute_prepared_update_query(query, params, cb))
            .await?;
        Ok((success_of(&args), count_of(&args)))
    }

    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued or the
    /// worker goes away before completing it.
    pub async fn execute_select(&self, query: &str) -> Result<bool, SqlDispatchError> {
        let args = self
            .request(|d, cb| d.execute_select_query(query, cb))
            .await?;
        Ok(success_of(&args))
    }

    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued or the
    /// worker goes away before completing it.
    pub async fn execute_prepared_select(
        &self,
        query: &str,
        params: Vec<Value>,
    ) -> Result<(bool, u64), SqlDispatchError> {
        let args = self
            .request(|d, cb| d.execute_prepared_select_query(query, params, cb))
            .await?;
        Ok((success_of(&args), count_of(&args)))
    }

    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued or the
    /// worker goes away before completing it.
    pub async fn fetch_array(
        &self,
        query: &str,
    ) -> Result<(bool, Vec<Vec<Value>>), SqlDispatchError> {
        let args = self.request(|d, cb| d.fetch_array(query, cb)).await?;
        Ok((success_of(&args), rows_of(args)))
    }

    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued or the
    /// worker goes away before completing it.
    pub async fn fetch_prepared_array(
        &self,
        query: &str,
        params: Vec<Value>,
    ) -> Result<(bool, Vec<Vec<Value>>), SqlDispatchError> {
        let args = self
            .request(|d, cb| d.fetch_prepared_array(query, params, cb))
            .await?;
        Ok((success_of(&args), rows_of(args)))
    }

    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued or the
    /// worker goes away before completing it.
    pub async fn fetch_mapped(
        &self,
        query: &str,
    ) -> Result<(bool, Vec<MappedRow>), SqlDispatchError> {
        let args = self.request(|d, cb| d.fetch_mapped(query, cb)).await?;
        Ok((success_of(&args), records_of(args)))
    }

    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued or the
    /// worker goes away before completing it.
    pub async fn fetch_prepared_mapped(
        &self,
        query: &str,
        params: Vec<Value>,
    ) -> Result<(bool, Vec<MappedRow>), SqlDispatchError> {
        let args = self
            .request(|d, cb| d.fetch_prepared_mapped(query, params, cb))
            .await?;
        Ok((success_of(&args), records_of(args)))
    }

    /// # Errors
    /// Returns [`SqlDispatchError`] if the task cannot be queued or the
    /// worker goes away before completing it.
    pub async fn close(&self) -> Result<(), SqlDispatchError> {
        self.request(|d, cb| d.close_connection(cb)).await?;
        Ok(())
    }

    async fn request(
        &self,
        submit: impl FnOnce(&SqlDispatcher, Callback) -> Result<(), SqlDispatchError>,
    ) -> Result<Vec<Argument>, SqlDispatchError> {
        let (tx, rx) = oneshot::channel();
        let target = Arc::new(OneshotTarget {
            slot: Mutex::new(Some(tx)),
        });
        let callback = Callback::new(target, "complete", Vec::new());
        submit(self.dispatcher, callback)?;
        rx.await.map_err(|_| {
            SqlDispatchError::ConnectionError(
                "dispatch worker dropped before completing the operation".into(),
            )
        })
    }
}

fn success_of(args: &[Argument]) -> bool {
    matches!(args.first(), Some(Argument::Success(true)))
}

fn count_of(args: &[Argument]) -> u64 {
    match args.get(1) {
        Some(Argument::Count(n)) => *n,
        _ => 0,
    }
}

fn rows_of(args: Vec<Argument>) -> Vec<Vec<Value>> {
    for arg in args {
        if let Argument::Rows(rows) = arg {
            return rows;
        }
    }
    Vec::new()
}

fn records_of(args: Vec<Argument>) -> Vec<MappedRow> {
    for arg in args {
        if let Argument::Records(rows) = arg {
            return rows;
        }
    }
    Vec::new()
}
