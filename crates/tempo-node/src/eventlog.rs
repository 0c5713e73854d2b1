//! Per-node event log
//!
//! Append-only sink plus mirrored console output. One line per event:
//! `<timestamp> | <EVENT> | Clock: <n> | <details>`. The scheduler is the
//! only writer for clock-related events, so the file path carries no lock;
//! the in-memory sink exists for test inspection.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;

use tempo_clock::TickRate;
use tempo_core::{EventKind, NodeId, TempoError, TempoResult};

/// Destination for rendered log lines
pub trait EventSink: Send {
    fn append(&mut self, line: &str);
}

/// Append-only file sink
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    pub fn open(path: impl AsRef<Path>) -> TempoResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| TempoError::LogSink(e.to_string()))?;
        Ok(FileSink {
            writer: BufWriter::new(file),
        })
    }
}

impl EventSink for FileSink {
    fn append(&mut self, line: &str) {
        let outcome = writeln!(self.writer, "{line}").and_then(|_| self.writer.flush());
        if let Err(e) = outcome {
            tracing::warn!("event log write failed: {}", e);
        }
    }
}

/// In-memory sink; handles are cheap clones sharing the same buffer
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Number of logged events of the given kind (header lines never match)
    pub fn count_kind(&self, kind: EventKind) -> usize {
        let marker = format!(" | {} | ", kind.as_str());
        self.lines
            .lock()
            .iter()
            .filter(|l| l.contains(&marker))
            .count()
    }

    pub fn contains_kind(&self, kind: EventKind) -> bool {
        self.count_kind(kind) > 0
    }
}

impl EventSink for MemorySink {
    fn append(&mut self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}

/// Event log for one node
pub struct EventLog {
    node: NodeId,
    sink: Box<dyn EventSink>,
    mirror: bool,
}

impl EventLog {
    pub fn new(node: NodeId, sink: Box<dyn EventSink>) -> Self {
        EventLog {
            node,
            sink,
            mirror: true,
        }
    }

    /// File-backed log, appending to `path`
    pub fn to_file(node: NodeId, path: impl AsRef<Path>) -> TempoResult<Self> {
        Ok(Self::new(node, Box::new(FileSink::open(path)?)))
    }

    /// Disable or enable the stdout mirror (tests turn it off)
    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    /// Two header lines written once at node creation: start timestamp and
    /// the sampled tick rate
    pub fn write_header(&mut self, rate: TickRate) {
        let started = humantime::format_rfc3339_seconds(SystemTime::now());
        self.sink
            .append(&format!("Node {} log started at {}", self.node, started));
        self.sink.append(&format!(
            "Clock rate: {} ticks per second",
            rate.ticks_per_second()
        ));
    }

    /// Append one event line and mirror it to stdout
    pub fn record(&mut self, kind: EventKind, clock: u64, details: &str) {
        let timestamp = humantime::format_rfc3339_seconds(SystemTime::now());
        let line = format!("{timestamp} | {kind} | Clock: {clock} | {details}");
        self.sink.append(&line);
        if self.mirror {
            println!("Node {}: {}", self.node, line);
        }
    }
}
