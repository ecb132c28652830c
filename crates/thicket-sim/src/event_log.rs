//! Optional JSON-lines dump of every engine event.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thicket_gameplay::{EngineEvent, EventHandler};
use tracing::{info, warn};

/// Writes one JSON object per event. Disabled when created without a path.
#[derive(Debug, Default)]
pub struct EventLog {
    out: Option<BufWriter<File>>,
    written: u64,
}

impl EventLog {
    /// Opens (and truncates) the log file, or returns a disabled log.
    pub fn create(path: Option<&Path>) -> io::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        info!("Writing events to {}", path.display());
        Ok(Self {
            out: Some(BufWriter::new(file)),
            written: 0,
        })
    }

    /// Number of events written.
    #[must_use]
    pub const fn written(&self) -> u64 {
        self.written
    }

    /// Flushes buffered lines.
    pub fn flush(&mut self) -> io::Result<()> {
        match &mut self.out {
            Some(out) => out.flush(),
            None => Ok(()),
        }
    }

    fn write(out: &mut BufWriter<File>, event: &EngineEvent) -> io::Result<()> {
        serde_json::to_writer(&mut *out, event)?;
        out.write_all(b"\n")
    }
}

impl EventHandler for EventLog {
    fn handle(&mut self, event: &EngineEvent) {
        let Some(out) = &mut self.out else {
            return;
        };
        match Self::write(out, event) {
            Ok(()) => self.written += 1,
            Err(e) => {
                warn!("Failed to write event log, disabling it: {e}");
                self.out = None;
            },
        }
    }
}
