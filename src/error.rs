use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while exporting a mesh.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Point or face arrays do not describe a polygon mesh
    #[error("{0}")]
    InvalidGeometryShape(String),

    /// Suffix is not one of stl, wrl, obj, ply, vtp
    #[error("Unsupported suffix {0}")]
    UnsupportedFormat(String),

    /// The writer failed, the file may be truncated
    #[error("Failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// Stable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ExportError::InvalidGeometryShape(_) => "InvalidGeometryShape",
            ExportError::UnsupportedFormat(_) => "UnsupportedFormat",
            ExportError::WriteFailure { .. } => "WriteFailure",
        }
    }

    pub(crate) fn write_failure<P: Into<PathBuf>>(path: P, source: std::io::Error) -> ExportError {
        ExportError::WriteFailure {
            path: path.into(),
            source,
        }
    }
}
