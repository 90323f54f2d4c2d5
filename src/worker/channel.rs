use crate::callback::Callback;
use crate::types::Value;

/// One queued operation. Every variant carries exactly the payload its
/// kind needs, so a malformed task cannot be constructed.
pub(crate) enum Command {
    Connect {
        callback: Callback,
    },
    SetSchema {
        schema: String,
        callback: Callback,
    },
    Execute {
        query: String,
        callback: Callback,
    },
    ExecutePrepared {
        query: String,
        params: Vec<Value>,
        callback: Callback,
    },
    ExecuteUpdate {
        query: String,
        callback: Callback,
    },
    ExecutePreparedUpdate {
        query: String,
        params: Vec<Value>,
        callback: Callback,
    },
    ExecuteSelect {
        query: String,
        callback: Callback,
    },
    ExecutePreparedSelect {
        query: String,
        params: Vec<Value>,
        callback: Callback,
    },
    FetchArray {
        query: String,
        callback: Callback,
    },
    FetchPreparedArray {
        query: String,
        params: Vec<Value>,
        callback: Callback,
    },
    FetchMapped {
        query: String,
        callback: Callback,
    },
    FetchPreparedMapped {
        query: String,
        params: Vec<Value>,
        callback: Callback,
    },
    Close {
        callback: Callback,
    },
    Shutdown,
}
