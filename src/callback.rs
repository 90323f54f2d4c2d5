use std::fmt;
use std::sync::Arc;

use crate::results::MappedRow;
use crate::types::Value;

/// A positional argument delivered to a completion callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// Whether the operation succeeded
    Success(bool),
    /// Affected-row or observed-row count
    Count(u64),
    /// Result rows in column order
    Rows(Vec<Vec<Value>>),
    /// Result rows keyed by column name
    Records(Vec<MappedRow>),
    /// A caller-supplied extra argument, forwarded verbatim
    Value(Value),
}

/// Receiver side of a completion callback: invoke the named method with
/// positional arguments. Called from the worker thread.
pub trait CallbackTarget: Send + Sync {
    fn call(&self, method: &str, args: Vec<Argument>);
}

/// Completion target captured with a task and invoked at most once, after
/// the task has executed and before the next task is dequeued.
pub struct Callback {
    target: Arc<dyn CallbackTarget>,
    method: String,
    extra: Vec<Value>,
}

impl Callback {
    pub fn new(
        target: Arc<dyn CallbackTarget>,
        method: impl Into<String>,
        extra: Vec<Value>,
    ) -> Self {
        Self {
            target,
            method: method.into(),
            extra,
        }
    }

    /// Deliver the operation's results, with the caller's extra arguments
    /// appended after them.
    pub(crate) fn complete(self, mut args: Vec<Argument>) {
        args.extend(self.extra.into_iter().map(Argument::Value));
        self.target.call(&self.method, args);
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("method", &self.method)
            .field("extra", &self.extra.len())
            .finish()
    }
}
