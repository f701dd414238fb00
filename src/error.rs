use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum MvdlError {
    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse config: {0}")]
    ConfigParse(String),

    #[error("no config decoder registered for extension {0:?}")]
    ConfigFormat(String),

    #[error("unknown skip condition: {0}")]
    UnknownCondition(String),

    #[error("could not parse duration {value:?}: {reason}")]
    InvalidDuration { value: String, reason: String },

    #[error("search request failed: {0}")]
    SearchHttp(String),

    #[error("search returned status {status}: {message}")]
    SearchStatus { status: u16, message: String },

    #[error("transfer failed: {0}")]
    TransferHttp(String),

    #[error("transfer returned status {status}: {message}")]
    TransferStatus { status: u16, message: String },

    #[error("no source url for result {0}")]
    NoSourceUrl(String),

    #[error("history file {path} is corrupt: {reason}")]
    HistoryCorrupt { path: String, reason: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
