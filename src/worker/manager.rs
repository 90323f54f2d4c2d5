use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use crate::error::SqlDispatchError;
use crate::manager::ConnectionManager;

use super::channel::Command;
use super::dispatcher::run_worker;

/// Producer-side handle to the dispatch thread: the sending half of the
/// queue, the shutdown flag, and the join handle.
pub(crate) struct WorkerHandle {
    sender: Sender<Command>,
    exit: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub(crate) fn spawn(manager: ConnectionManager) -> Result<Self, SqlDispatchError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let exit = Arc::new(AtomicBool::new(false));
        let exit_flag = Arc::clone(&exit);
        let join = thread::Builder::new()
            .name("sql-dispatch-worker".to_string())
            .spawn(move || run_worker(manager, &receiver, &exit_flag))
            .map_err(|err| {
                SqlDispatchError::ConnectionError(format!(
                    "failed to spawn dispatch worker thread: {err}"
                ))
            })?;

        Ok(Self {
            sender,
            exit,
            join: Some(join),
        })
    }

    pub(crate) fn send(&self, command: Command) -> Result<(), SqlDispatchError> {
        self.sender
            .send(command)
            .map_err(|_| SqlDispatchError::ConnectionError("dispatch worker closed".into()))
    }

    /// Set the exit flag, post one shutdown wake, and wait for the worker
    /// to finish. A task already executing completes and reports; tasks
    /// still queued behind the flag are dropped without their callbacks.
    pub(crate) fn shutdown(&mut self) {
        self.exit.store(true, Ordering::Release);
        let _ = self.sender.send(Command::Shutdown);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
