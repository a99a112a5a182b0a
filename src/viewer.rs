//! Tabbed presentation of a completed translation, plus copy and export.

use tracing::{info, warn};

use crate::environment::Environment;
use crate::model::{Section, TranslationResult};
use crate::submission::SubmissionState;

/// Name of the exported document.
pub const EXPORT_FILE_NAME: &str = "bizspec-result.txt";

/// Renders every section, in fixed order, as one plain-text document.
///
/// Each section is `# <Title>`, a blank line, then the raw text; sections are
/// separated by a blank line.
pub fn export_document(result: &TranslationResult) -> String {
    Section::ALL
        .iter()
        .map(|section| format!("# {}\n\n{}", section.title(), section.content(result)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// What the viewer is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewerState {
    #[default]
    NoResult,
    Showing {
        /// Submission whose result is on screen.
        submission_id: u64,
        selection: Section,
    },
}

/// Outcome of a copy or export, shown briefly to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Copied(Section),
    Exported(String),
    Failed(String),
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::Copied(section) => format!("Copied {} to clipboard", section.label()),
            Notice::Exported(path) => format!("Saved {}", path),
            Notice::Failed(msg) => msg.clone(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Failed(_))
    }
}

/// Tab selection over the current result. Never mutates submission state.
#[derive(Debug, Default)]
pub struct ResultViewer {
    state: ViewerState,
}

impl ResultViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The selected section, if a result is showing.
    pub fn selection(&self) -> Option<Section> {
        match self.state {
            ViewerState::Showing { selection, .. } => Some(selection),
            ViewerState::NoResult => None,
        }
    }

    /// Follows the submission lifecycle. A new result always opens on the first section.
    ///
    /// Returns true when the viewer state changed.
    pub fn observe(&mut self, submission: &SubmissionState, submission_id: u64) -> bool {
        let next = match (submission, self.state) {
            (SubmissionState::Succeeded { .. }, ViewerState::Showing { submission_id: shown, .. })
                if shown == submission_id =>
            {
                self.state
            }
            (SubmissionState::Succeeded { .. }, _) => ViewerState::Showing {
                submission_id,
                selection: Section::ALL[0],
            },
            _ => ViewerState::NoResult,
        };
        let changed = next != self.state;
        self.state = next;
        changed
    }

    /// Switches to `section`. Has no effect when nothing is showing.
    pub fn select_section(&mut self, section: Section) {
        if let ViewerState::Showing { selection, .. } = &mut self.state {
            *selection = section;
        }
    }

    pub fn select_next(&mut self) {
        if let Some(current) = self.selection() {
            self.select_section(current.next());
        }
    }

    pub fn select_prev(&mut self) {
        if let Some(current) = self.selection() {
            self.select_section(current.prev());
        }
    }

    /// Text of the selected section.
    pub fn visible_content<'a>(&self, submission: &'a SubmissionState) -> Option<&'a str> {
        let result = submission.result()?;
        self.selection().map(|section| section.content(result))
    }

    /// Copies the visible section to the clipboard. Failures come back as a notice.
    pub fn copy_visible_content(
        &self,
        submission: &SubmissionState,
        env: &mut dyn Environment,
    ) -> Notice {
        let (Some(section), Some(text)) = (self.selection(), self.visible_content(submission))
        else {
            return Notice::Failed("Nothing to copy".to_string());
        };

        match env.copy_to_clipboard(text) {
            Ok(()) => {
                info!(section = section.id(), "section_copied");
                Notice::Copied(section)
            }
            Err(e) => {
                warn!(section = section.id(), error = %e, "section_copy_failed");
                Notice::Failed(format!("Copy failed: {}", e))
            }
        }
    }

    /// Saves all four sections as [`EXPORT_FILE_NAME`]. Failures come back as a notice.
    pub fn export_all(&self, submission: &SubmissionState, env: &mut dyn Environment) -> Notice {
        let Some(result) = submission
            .result()
            .filter(|_| self.selection().is_some())
        else {
            return Notice::Failed("Nothing to export".to_string());
        };

        match env.save_file(EXPORT_FILE_NAME, &export_document(result)) {
            Ok(path) => {
                info!(path = ?path, "result_exported");
                Notice::Exported(path.display().to_string())
            }
            Err(e) => {
                warn!(error = %e, "result_export_failed");
                Notice::Failed(format!("Export failed: {}", e))
            }
        }
    }
}

#[cfg(test)]
impl ResultViewer {
    pub fn state(&self) -> ViewerState {
        self.state
    }
}
