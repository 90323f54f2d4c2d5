//! In-memory scripted database client used across the integration tests.
//!
//! Queries resolve to registered result tables; prepared statements record
//! their bindings so tests can assert on what reached the client. Queries
//! starting with "ECHO" return the bound parameters back as a single row.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use sql_dispatch::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(String),
}

#[derive(Clone)]
pub struct Column {
    pub name: String,
    pub sql_type: SqlType,
    pub signed: bool,
}

impl Column {
    pub fn new(name: &str, sql_type: SqlType, signed: bool) -> Self {
        Self {
            name: name.to_string(),
            sql_type,
            signed,
        }
    }
}

#[derive(Clone)]
pub enum Cell {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

#[derive(Clone)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

/// State shared between a [`MemoryClient`] and the test body.
pub struct Shared {
    pub tables: Mutex<HashMap<String, Table>>,
    pub updates: Mutex<HashMap<String, u64>>,
    pub failures: Mutex<HashMap<String, ClientError>>,
    pub executed: Mutex<Vec<String>>,
    pub bindings: Mutex<Vec<Vec<Option<Bound>>>>,
    pub schemas: Mutex<Vec<String>>,
    pub delay: Mutex<Option<Duration>>,
    pub valid: AtomicBool,
    pub reconnect_error: AtomicBool,
    pub fail_connect: AtomicBool,
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
    in_flight: AtomicUsize,
    pub overlapped: AtomicBool,
}

impl Shared {
    fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            updates: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            executed: Mutex::new(Vec::new()),
            bindings: Mutex::new(Vec::new()),
            schemas: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
            valid: AtomicBool::new(true),
            reconnect_error: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            overlapped: AtomicBool::new(false),
        }
    }

    pub fn register_table(&self, query: &str, table: Table) {
        self.tables.lock().unwrap().insert(query.to_string(), table);
    }

    pub fn register_update(&self, query: &str, affected: u64) {
        self.updates
            .lock()
            .unwrap()
            .insert(query.to_string(), affected);
    }

    pub fn register_failure(&self, query: &str, error: ClientError) {
        self.failures
            .lock()
            .unwrap()
            .insert(query.to_string(), error);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn last_bindings(&self) -> Option<Vec<Option<Bound>>> {
        self.bindings.lock().unwrap().last().cloned()
    }

    /// Poll until the given query has been handed to the client.
    pub fn wait_for_execution(&self, query: &str, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            if self.executed().iter().any(|q| q == query) {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn run(&self, query: &str) -> Result<(), ClientError> {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        self.executed.lock().unwrap().push(query.to_string());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        let failure = self.failures.lock().unwrap().get(query).cloned();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn table_for(&self, query: &str) -> Result<Table, ClientError> {
        self.tables.lock().unwrap().get(query).cloned().ok_or_else(|| {
            ClientError::new(format!("no result registered for query: {query}"), 1146, "42S02")
        })
    }
}

pub struct MemoryClient {
    shared: Arc<Shared>,
}

impl MemoryClient {
    pub fn new() -> (Self, Arc<Shared>) {
        let shared = Arc::new(Shared::new());
        (
            Self {
                shared: Arc::clone(&shared),
            },
            shared,
        )
    }
}

impl DatabaseClient for MemoryClient {
    fn connect(
        &mut self,
        _properties: &ConnectionProperties,
    ) -> Result<Box<dyn Connection>, ClientError> {
        if self.shared.fail_connect.load(Ordering::SeqCst) {
            return Err(ClientError::new("access denied", 1045, "28000"));
        }
        self.shared.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection {
            shared: Arc::clone(&self.shared),
            closed: false,
        }))
    }
}

struct MemoryConnection {
    shared: Arc<Shared>,
    closed: bool,
}

impl Connection for MemoryConnection {
    fn is_valid(&mut self) -> bool {
        self.shared.valid.load(Ordering::SeqCst) && !self.closed
    }

    fn reconnect(&mut self) -> Result<bool, ClientError> {
        if self.shared.reconnect_error.load(Ordering::SeqCst) {
            return Err(ClientError::new("server has gone away", 2006, "HY000"));
        }
        Ok(self.shared.valid.load(Ordering::SeqCst) && !self.closed)
    }

    fn set_schema(&mut self, schema: &str) -> Result<(), ClientError> {
        self.shared.schemas.lock().unwrap().push(schema.to_string());
        Ok(())
    }

    fn execute(&mut self, query: &str) -> Result<bool, ClientError> {
        self.shared.run(query)?;
        Ok(self.shared.tables.lock().unwrap().contains_key(query))
    }

    fn execute_update(&mut self, query: &str) -> Result<u64, ClientError> {
        self.shared.run(query)?;
        Ok(self
            .shared
            .updates
            .lock()
            .unwrap()
            .get(query)
            .copied()
            .unwrap_or(1))
    }

    fn execute_query<'a>(&'a mut self, query: &str) -> Result<Box<dyn RowSet + 'a>, ClientError> {
        self.shared.run(query)?;
        let table = self.shared.table_for(query)?;
        Ok(Box::new(MemoryRowSet::new(table)))
    }

    fn prepare<'a>(
        &'a mut self,
        query: &str,
    ) -> Result<Box<dyn PreparedStatement + 'a>, ClientError> {
        Ok(Box::new(MemoryStatement {
            shared: Arc::clone(&self.shared),
            query: query.to_string(),
            bound: Vec::new(),
        }))
    }

    fn close(&mut self) -> Result<(), ClientError> {
        self.closed = true;
        self.shared.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

struct MemoryStatement {
    shared: Arc<Shared>,
    query: String,
    bound: Vec<Option<Bound>>,
}

impl MemoryStatement {
    fn record(&mut self, index: usize, value: Bound) {
        if self.bound.len() <= index {
            self.bound.resize(index + 1, None);
        }
        self.bound[index] = Some(value);
    }

    fn snapshot(&self) {
        self.shared.bindings.lock().unwrap().push(self.bound.clone());
    }

    fn echo_table(&self) -> Table {
        let mut columns = Vec::new();
        let mut row = Vec::new();
        for (i, slot) in self.bound.iter().enumerate() {
            let name = format!("c{i}");
            match slot {
                Some(Bound::Bool(b)) => {
                    columns.push(Column::new(&name, SqlType::Bit, true));
                    row.push(Cell::Bool(*b));
                }
                Some(Bound::Int(v)) => {
                    columns.push(Column::new(&name, SqlType::BigInt, true));
                    row.push(Cell::Int(*v));
                }
                Some(Bound::Float(v)) => {
                    columns.push(Column::new(&name, SqlType::Double, true));
                    row.push(Cell::Float(*v));
                }
                Some(Bound::Text(s)) => {
                    columns.push(Column::new(&name, SqlType::VarChar, true));
                    row.push(Cell::Text(s.clone()));
                }
                Some(Bound::DateTime(s)) => {
                    columns.push(Column::new(&name, SqlType::DateTime, true));
                    row.push(Cell::Text(s.clone()));
                }
                Some(Bound::Null) | None => {
                    columns.push(Column::new(&name, SqlType::Null, true));
                    row.push(Cell::Text(String::new()));
                }
            }
        }
        Table {
            columns,
            rows: vec![row],
        }
    }
}

impl PreparedStatement for MemoryStatement {
    fn set_null(&mut self, index: usize) -> Result<(), ClientError> {
        self.record(index, Bound::Null);
        Ok(())
    }

    fn set_bool(&mut self, index: usize, value: bool) -> Result<(), ClientError> {
        self.record(index, Bound::Bool(value));
        Ok(())
    }

    fn set_i64(&mut self, index: usize, value: i64) -> Result<(), ClientError> {
        self.record(index, Bound::Int(value));
        Ok(())
    }

    fn set_f64(&mut self, index: usize, value: f64) -> Result<(), ClientError> {
        self.record(index, Bound::Float(value));
        Ok(())
    }

    fn set_string(&mut self, index: usize, value: &str) -> Result<(), ClientError> {
        self.record(index, Bound::Text(value.to_string()));
        Ok(())
    }

    fn set_datetime(&mut self, index: usize, value: &str) -> Result<(), ClientError> {
        self.record(index, Bound::DateTime(value.to_string()));
        Ok(())
    }

    fn execute(&mut self) -> Result<bool, ClientError> {
        self.snapshot();
        self.shared.run(&self.query)?;
        Ok(true)
    }

    fn execute_update(&mut self) -> Result<u64, ClientError> {
        self.snapshot();
        self.shared.run(&self.query)?;
        Ok(self
            .shared
            .updates
            .lock()
            .unwrap()
            .get(&self.query)
            .copied()
            .unwrap_or(1))
    }

    fn execute_query<'a>(&'a mut self) -> Result<Box<dyn RowSet + 'a>, ClientError> {
        self.snapshot();
        self.shared.run(&self.query)?;
        let table = if self.query.starts_with("ECHO") {
            self.echo_table()
        } else {
            self.shared.table_for(&self.query)?
        };
        Ok(Box::new(MemoryRowSet::new(table)))
    }
}

struct MemoryRowSet {
    table: Table,
    cursor: Option<usize>,
}

impl MemoryRowSet {
    fn new(table: Table) -> Self {
        Self {
            table,
            cursor: None,
        }
    }

    fn cell(&self, index: usize) -> Result<&Cell, ClientError> {
        let row = self
            .cursor
            .and_then(|r| self.table.rows.get(r))
            .ok_or_else(|| ClientError::new("cursor is not positioned on a row", 0, "HY000"))?;
        row.get(index)
            .ok_or_else(|| ClientError::new("column index out of range", 0, "HY000"))
    }
}

impl RowSet for MemoryRowSet {
    fn advance(&mut self) -> Result<bool, ClientError> {
        let next = self.cursor.map_or(0, |c| c + 1);
        self.cursor = Some(next);
        Ok(next < self.table.rows.len())
    }

    fn column_count(&self) -> usize {
        self.table.columns.len()
    }

    fn column_name(&self, index: usize) -> &str {
        &self.table.columns[index].name
    }

    fn column_type(&self, index: usize) -> SqlType {
        self.table.columns[index].sql_type
    }

    fn column_is_signed(&self, index: usize) -> bool {
        self.table.columns[index].signed
    }

    fn get_bool(&self, index: usize) -> Result<bool, ClientError> {
        match self.cell(index)? {
            Cell::Bool(b) => Ok(*b),
            Cell::Int(i) => Ok(*i != 0),
            _ => Err(type_mismatch("bool")),
        }
    }

    fn get_i32(&self, index: usize) -> Result<i32, ClientError> {
        match self.cell(index)? {
            Cell::Int(i) => Ok(*i as i32),
            Cell::UInt(u) => Ok(*u as i32),
            _ => Err(type_mismatch("i32")),
        }
    }

    fn get_u32(&self, index: usize) -> Result<u32, ClientError> {
        match self.cell(index)? {
            Cell::UInt(u) => Ok(*u as u32),
            Cell::Int(i) => Ok(*i as u32),
            _ => Err(type_mismatch("u32")),
        }
    }

    fn get_i64(&self, index: usize) -> Result<i64, ClientError> {
        match self.cell(index)? {
            Cell::Int(i) => Ok(*i),
            Cell::UInt(u) => Ok(*u as i64),
            _ => Err(type_mismatch("i64")),
        }
    }

    fn get_u64(&self, index: usize) -> Result<u64, ClientError> {
        match self.cell(index)? {
            Cell::UInt(u) => Ok(*u),
            Cell::Int(i) => Ok(*i as u64),
            _ => Err(type_mismatch("u64")),
        }
    }

    fn get_f64(&self, index: usize) -> Result<f64, ClientError> {
        match self.cell(index)? {
            Cell::Float(f) => Ok(*f),
            Cell::Int(i) => Ok(*i as f64),
            _ => Err(type_mismatch("f64")),
        }
    }

    fn get_string(&self, index: usize) -> Result<String, ClientError> {
        Ok(match self.cell(index)? {
            Cell::Bool(b) => {
                if *b {
                    "1".to_string()
                } else {
                    "0".to_string()
                }
            }
            Cell::Int(i) => i.to_string(),
            Cell::UInt(u) => u.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Text(s) => s.clone(),
        })
    }
}

fn type_mismatch(expected: &str) -> ClientError {
    ClientError::new(format!("cell cannot be read as {expected}"), 0, "HY000")
}

/// Callback target that records every invocation.
pub struct RecordingTarget {
    calls: Mutex<Vec<(String, Vec<Argument>)>>,
}

impl RecordingTarget {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, Vec<Argument>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Poll until at least `n` callbacks have arrived.
    pub fn wait_for_calls(&self, n: usize, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            if self.calls().len() >= n {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

impl CallbackTarget for RecordingTarget {
    fn call(&self, method: &str, args: Vec<Argument>) {
        self.calls.lock().unwrap().push((method.to_string(), args));
    }
}

pub fn callback(target: &Arc<RecordingTarget>, method: &str) -> Callback {
    Callback::new(Arc::clone(target) as Arc<dyn CallbackTarget>, method, Vec::new())
}

pub fn callback_with(target: &Arc<RecordingTarget>, method: &str, extra: Vec<Value>) -> Callback {
    Callback::new(Arc::clone(target) as Arc<dyn CallbackTarget>, method, extra)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
