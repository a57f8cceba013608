//! Errors raised while loading a pipeline description

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::graph::GraphError;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read pipeline: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid pipeline JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pipeline: {0}")]
    Graph(#[from] GraphError),
}

impl LoadError {
    /// Format the error with source context using ariadne.
    ///
    /// Only JSON errors carry a position; the others fall back to their
    /// plain message.
    pub fn format(&self, source: &str, filename: &str) -> String {
        let LoadError::Json(err) = self else {
            return self.to_string();
        };
        let offset = byte_offset(source, err.line(), err.column());
        let span = offset..(offset + 1).min(source.len()).max(offset);

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, offset)
            .with_message("invalid pipeline JSON")
            .with_label(
                Label::new((filename, span))
                    .with_message(err.to_string())
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);
        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

/// Byte offset of a 1-based line and column, clamped to the source
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(source.len())
}
