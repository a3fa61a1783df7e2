use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("input file not found or unreadable: {path}")]
    MissingInput { path: PathBuf },

    #[error("failed to decode image {path}: {message}")]
    ImageDecode { path: PathBuf, message: String },

    #[error("failed to write capture artifact {path}: {source}")]
    CaptureWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read capture artifact {path}: {source}")]
    CaptureRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to list capture directory {path}: {source}")]
    StoreList {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("template file {path} is invalid: {message}")]
    InvalidTemplateFile { path: PathBuf, message: String },

    #[error("landmark payload in {path} failed validation: {message}")]
    LandmarkValidation { path: PathBuf, message: String },

    #[error("no enrollment found for the {side} hand")]
    HandNotEnrolled { side: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to read configuration file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AppError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            AppError::MissingInput { .. } => ExitCode::from(2),
            AppError::ImageDecode { .. } => ExitCode::from(2),
            AppError::InvalidTemplateFile { .. } => ExitCode::from(2),
            AppError::ConfigRead { .. } => ExitCode::from(2),
            AppError::ConfigParse { .. } => ExitCode::from(2),
            AppError::LandmarkValidation { .. } => ExitCode::from(3),
            AppError::HandNotEnrolled { .. } => ExitCode::from(4),
            AppError::CaptureRead { .. } => ExitCode::from(2),
            AppError::StoreList { .. } => ExitCode::from(2),
            _ => ExitCode::from(1),
        }
    }

    pub fn human_message(&self) -> String {
        self.to_string()
    }
}

pub type AppResult<T> = Result<T, AppError>;
