use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::trace::trace::TraceEvent;

/// Appends one JSON line per filled record. A trace file that cannot be
/// opened turns the logger off; fill passes never fail because of it.
pub struct TraceLogger {
    path: PathBuf,
    sink: Option<Mutex<File>>,
}

impl TraceLogger {
    /// Opens `path` for appending, creating missing parent directories.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let sink = match open_append(&path) {
            Ok(file) => {
                debug!(target: "trace", path = %path.display(), "tracing fill outcomes");
                Some(Mutex::new(file))
            }
            Err(e) => {
                warn!(target: "trace", path = %path.display(), error = %e, "could not open trace file");
                None
            }
        };
        TraceLogger { path, sink }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log(&self, event: &TraceEvent) {
        let Some(sink) = &self.sink else { return };
        let Ok(mut file) = sink.lock() else {
            warn!(target: "trace", "trace file lock poisoned, dropping event");
            return;
        };
        if let Err(e) = write_line(&mut *file, event) {
            warn!(target: "trace", path = %self.path.display(), question = %event.question, error = %e, "trace write failed");
        }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn write_line(out: &mut impl Write, event: &TraceEvent) -> io::Result<()> {
    serde_json::to_writer(&mut *out, event)?;
    out.write_all(b"\n")
}
