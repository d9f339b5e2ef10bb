//! Pipeline agent logging commands.
//!
//! The agent scans task stdout for `##vso[...]` lines; a `task.logissue`
//! line with a `code` property attaches the failure code to the task's
//! error summary.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::ErrorCode;

/// Formats the logging command that reports `code` as a task error.
pub fn error_issue_line(code: &ErrorCode) -> String {
    format!(
        "##vso[task.logissue type=error;code={};]",
        escape_property(code.as_str())
    )
}

/// Destination of logging commands, stdout unless replaced.
#[derive(Clone, Default)]
pub(crate) enum IssueWriter {
    #[default]
    Stdout,
    Custom(Arc<Mutex<dyn Write + Send>>),
}

impl IssueWriter {
    pub(crate) fn custom(writer: impl Write + Send + 'static) -> Self {
        Self::Custom(Arc::new(Mutex::new(writer)))
    }

    /// Writes [`error_issue_line`] for `code`. Write failures are ignored.
    pub(crate) fn report_error_code(&self, code: &ErrorCode) {
        let line = error_issue_line(code);
        match self {
            Self::Stdout => {
                let _ = writeln!(io::stdout().lock(), "{line}");
            }
            Self::Custom(writer) => {
                if let Ok(mut writer) = writer.lock() {
                    let _ = writeln!(writer, "{line}");
                }
            }
        }
    }
}

// Property values may not contain the command delimiters.
fn escape_property(value: &str) -> String {
    value
        .replace('%', "%AZP25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
        .replace(';', "%3B")
        .replace(']', "%5D")
}
