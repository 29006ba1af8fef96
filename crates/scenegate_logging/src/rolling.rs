//! Size-rotated log file writer.
//!
//! `<dir>/<name>.log` is the live file; on overflow it becomes `<name>.log.1`,
//! older files shift up, and anything past `max_files` is deleted.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

struct RollingFile {
    dir: PathBuf,
    base_name: String,
    max_files: usize,
    max_size: u64,
    file: Option<File>,
    current_size: u64,
}

impl RollingFile {
    fn open(dir: PathBuf, base_name: &str, max_files: usize, max_size: u64) -> io::Result<Self> {
        fs::create_dir_all(&dir)?;
        let mut rolling = Self {
            dir,
            base_name: sanitize_name(base_name),
            max_files: max_files.max(1),
            max_size,
            file: None,
            current_size: 0,
        };
        rolling.reopen()?;
        if rolling.current_size > rolling.max_size {
            rolling.rotate()?;
        }
        Ok(rolling)
    }

    fn reopen(&mut self) -> io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.current_path())?;
        self.current_size = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    fn current_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.base_name))
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{}", self.base_name, index))
    }

    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }

        let max_index = self.max_files.saturating_sub(1);
        if max_index == 0 {
            // Single-file mode: truncate in place.
            File::create(self.current_path())?;
            return self.reopen();
        }

        let oldest = self.rotated_path(max_index);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for idx in (1..max_index).rev() {
            let src = self.rotated_path(idx);
            if src.exists() {
                fs::rename(&src, self.rotated_path(idx + 1))?;
            }
        }
        let current = self.current_path();
        if current.exists() {
            fs::rename(current, self.rotated_path(1))?;
        }

        self.reopen()
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.current_size > 0 && self.current_size + buf.len() as u64 > self.max_size {
            self.rotate()?;
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file unavailable"))?;
        let bytes = file.write(buf)?;
        self.current_size += bytes as u64;
        Ok(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Cloneable handle to one rolling log file, usable as a `MakeWriter`.
#[derive(Clone)]
pub struct SharedRollingWriter {
    inner: Arc<Mutex<RollingFile>>,
}

impl SharedRollingWriter {
    pub fn new(dir: PathBuf, base_name: &str, max_files: usize, max_size: u64) -> io::Result<Self> {
        let file = RollingFile::open(dir, base_name, max_files, max_size)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(file)),
        })
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedRollingWriter {
    type Writer = SharedRollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Write for SharedRollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?
            .flush()
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_to_current_file() {
        let dir = TempDir::new().unwrap();
        let mut writer = SharedRollingWriter::new(dir.path().to_path_buf(), "scenegate", 3, 1024).unwrap();
        writer.write_all(b"turn decided\n").unwrap();
        writer.flush().unwrap();

        let content = fs::read_to_string(dir.path().join("scenegate.log")).unwrap();
        assert_eq!(content, "turn decided\n");
    }

    #[test]
    fn test_rotates_and_caps_file_count() {
        let dir = TempDir::new().unwrap();
        let mut writer = SharedRollingWriter::new(dir.path().to_path_buf(), "repl", 3, 10).unwrap();
        for line in ["aaaaaaaa\n", "bbbbbbbb\n", "cccccccc\n", "dddddddd\n"] {
            writer.write_all(line.as_bytes()).unwrap();
        }
        writer.flush().unwrap();

        let read = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(read("repl.log"), "dddddddd\n");
        assert_eq!(read("repl.log.1"), "cccccccc\n");
        assert_eq!(read("repl.log.2"), "bbbbbbbb\n");
        assert!(!dir.path().join("repl.log.3").exists());
    }

    #[test]
    fn test_single_file_mode_truncates() {
        let dir = TempDir::new().unwrap();
        let mut writer = SharedRollingWriter::new(dir.path().to_path_buf(), "solo", 1, 10).unwrap();
        writer.write_all(b"first line\n").unwrap();
        writer.write_all(b"second\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("solo.log")).unwrap(), "second\n");
        assert!(!dir.path().join("solo.log.1").exists());
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("scene gate/cli"), "scene_gate_cli");
        assert_eq!(sanitize_name("repl-2_x"), "repl-2_x");
    }
}
