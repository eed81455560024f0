//! Optional trace file of every frame sent to or received from the server.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{LazyLock, Mutex};
use std::time::Instant;

static WIRE_LOGGER: LazyLock<Mutex<WireLogger>> = LazyLock::new(|| Mutex::new(WireLogger::new()));

/// Direction of a traced frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    const fn label(self) -> &'static str {
        match self {
            Self::Sent => "send",
            Self::Received => "recv",
        }
    }
}

#[derive(Debug)]
struct WireLogger {
    enabled: bool,
    start: Instant,
    writer: Option<BufWriter<File>>,
}

impl WireLogger {
    fn new() -> Self {
        Self {
            enabled: false,
            start: Instant::now(),
            writer: None,
        }
    }
}

/// Start tracing to `path` (truncating it), or stop tracing with `None`.
pub fn set_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let mut logger = WIRE_LOGGER.lock().expect("wire logger lock poisoned");
    if let Some(path) = path {
        let file = File::create(path)?;
        logger.enabled = true;
        logger.start = Instant::now();
        logger.writer = Some(BufWriter::new(file));
        if let Some(writer) = logger.writer.as_mut() {
            writeln!(writer, "fuzzynote wire log start")?;
            writer.flush()?;
        }
    } else {
        logger.enabled = false;
        logger.writer = None;
    }
    Ok(())
}

/// Append one frame. Write failures are ignored.
pub fn log_frame(direction: Direction, frame: &str) {
    let mut logger = WIRE_LOGGER.lock().expect("wire logger lock poisoned");
    if !logger.enabled {
        return;
    }
    let elapsed_ms = logger.start.elapsed().as_secs_f64() * 1000.0;
    if let Some(writer) = logger.writer.as_mut() {
        let _ = writeln!(writer, "[{elapsed_ms:>10.3} ms] {}: {frame}", direction.label());
        let _ = writer.flush();
    }
}
