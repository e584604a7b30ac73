//! Output sinks for serialized trace events

use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Append-only destination for trace JSON
///
/// Only the flush path writes to a sink, always under the tracer's flush
/// lock, so implementations need not be internally synchronized.
pub trait TraceSink: Write + Send {
    /// Make bytes written so far durable
    ///
    /// Called after [`Write::flush`] when `sync_on_flush` is enabled. The
    /// default does nothing, which suits in-memory sinks.
    ///
    /// # Errors
    ///
    /// Returns the underlying OS error if the data cannot be synced.
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Buffered trace file
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    /// Create or truncate the trace file at `path`
    ///
    /// # Errors
    ///
    /// Returns the OS error if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Path of the trace file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.writer.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl TraceSink for FileSink {
    fn sync(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()
    }
}

/// Shared in-memory sink
///
/// Clones share one buffer, so a test can hand one clone to the tracer and
/// inspect the output through another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }

    /// Everything written so far as text
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.bytes.lock().len()
    }

    /// Returns true if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl TraceSink for MemorySink {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_shares_buffer() -> io::Result<()> {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        assert!(sink.is_empty());

        writer.write_all(b"{\"traceEvents\": [")?;
        writer.sync()?;

        assert_eq!(sink.contents(), "{\"traceEvents\": [");
        assert_eq!(sink.len(), 17);
        Ok(())
    }

    #[test]
    fn test_file_sink_writes_and_syncs() -> io::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("trace.json");

        let mut sink = FileSink::create(&path)?;
        assert_eq!(sink.path(), path.as_path());
        sink.write_all(b"hello")?;
        sink.sync()?;

        assert_eq!(std::fs::read_to_string(&path)?, "hello");
        Ok(())
    }

    #[test]
    fn test_file_sink_missing_directory() {
        let result = FileSink::create("/nonexistent-openracing-dir/trace.json");
        assert!(result.is_err());
    }
}
