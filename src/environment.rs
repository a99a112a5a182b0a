//! Side-effect capabilities the result viewer needs from its host.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crossterm::clipboard::CopyToClipboard;
use crossterm::execute;
use tracing::{debug, info};

/// Clipboard and file-save access, kept behind a trait so the viewer stays testable.
pub trait Environment {
    /// Places `text` on the system clipboard.
    fn copy_to_clipboard(&mut self, text: &str) -> io::Result<()>;

    /// Saves `contents` under `file_name`, returning where it ended up.
    fn save_file(&mut self, file_name: &str, contents: &str) -> io::Result<PathBuf>;
}

/// Real environment: OSC 52 clipboard through the terminal, files in an export directory.
pub struct TerminalEnvironment<W: Write> {
    out: W,
    export_dir: PathBuf,
}

impl<W: Write> TerminalEnvironment<W> {
    pub fn new(out: W, export_dir: PathBuf) -> Self {
        Self { out, export_dir }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }
}

impl<W: Write> Environment for TerminalEnvironment<W> {
    fn copy_to_clipboard(&mut self, text: &str) -> io::Result<()> {
        execute!(self.out, CopyToClipboard::to_clipboard_from(text))?;
        debug!(chars = text.chars().count(), "clipboard_written");
        Ok(())
    }

    fn save_file(&mut self, file_name: &str, contents: &str) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.export_dir)?;
        let path = self.export_dir.join(file_name);
        fs::write(&path, contents)?;
        info!(path = ?path, bytes = contents.len(), "file_saved");
        Ok(path)
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Records every side effect instead of performing it.
    #[derive(Debug, Default)]
    pub struct RecordingEnvironment {
        pub clipboard: Vec<String>,
        pub saved: Vec<(String, String)>,
        pub fail: bool,
    }

    impl RecordingEnvironment {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    impl Environment for RecordingEnvironment {
        fn copy_to_clipboard(&mut self, text: &str) -> io::Result<()> {
            if self.fail {
                return Err(io::Error::other("clipboard unavailable"));
            }
            self.clipboard.push(text.to_string());
            Ok(())
        }

        fn save_file(&mut self, file_name: &str, contents: &str) -> io::Result<PathBuf> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
            self.saved.push((file_name.to_string(), contents.to_string()));
            Ok(PathBuf::from(file_name))
        }
    }
}
