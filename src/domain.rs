use std::io::Error;

use derive_setters::Setters;
use polars::error::PolarsError;

#[derive(Debug)]
pub enum TSError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
    BadPath(String),
}

impl From<Error> for TSError {
    fn from(err: Error) -> Self {
        TSError::IoError(err)
    }
}

impl From<PolarsError> for TSError {
    fn from(err: PolarsError) -> Self {
        TSError::PolarsError(err)
    }
}

/// Messages produced by the controller and applied to the store by the main loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Quit,
    ToggleTable,
}

#[derive(Debug, Clone, Setters)]
pub struct TSConfig {
    /// Time in ms the controller blocks waiting for a terminal event.
    pub event_poll_time: u64,
    /// Columns wider than this are truncated when rendered.
    pub max_column_width: usize,
}

impl Default for TSConfig {
    fn default() -> Self {
        TSConfig {
            event_poll_time: 100,
            max_column_width: 32,
        }
    }
}
