use crate::error::ExportError;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The output formats, named by their file suffix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshFormat {
    Stl,
    Wrl,
    Obj,
    Ply,
    Vtp,
}

impl MeshFormat {
    pub const ALL: [MeshFormat; 5] = [
        MeshFormat::Stl,
        MeshFormat::Wrl,
        MeshFormat::Obj,
        MeshFormat::Ply,
        MeshFormat::Vtp,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            MeshFormat::Stl => "stl",
            MeshFormat::Wrl => "wrl",
            MeshFormat::Obj => "obj",
            MeshFormat::Ply => "ply",
            MeshFormat::Vtp => "vtp",
        }
    }

    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Option<MeshFormat> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    /// OBJ and VRML serialise a render scene rather than raw geometry.
    pub fn requires_scene(&self) -> bool {
        matches!(self, MeshFormat::Obj | MeshFormat::Wrl)
    }

    /// Whether the ASCII/binary switch changes the output.
    pub fn has_binary_encoding(&self) -> bool {
        !self.requires_scene()
    }
}

impl FromStr for MeshFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<MeshFormat, ExportError> {
        MeshFormat::ALL
            .iter()
            .find(|f| f.suffix().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| ExportError::UnsupportedFormat(s.to_string()))
    }
}

impl fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// ASCII or binary encoding for the formats that have both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FileType {
    #[default]
    Ascii,
    Binary,
}

impl FileType {
    pub fn is_ascii(&self) -> bool {
        *self == FileType::Ascii
    }
}

/// Work out where a mesh goes and in which format.
///
/// A recognised extension on `output_path` wins over `hint`. Otherwise the
/// hint's suffix is appended, so `mesh` becomes `mesh.ply` and `mesh.v2`
/// becomes `mesh.v2.ply`.
pub fn resolve_output(output_path: &Path, hint: MeshFormat) -> (PathBuf, MeshFormat) {
    if let Some(format) = MeshFormat::from_path(output_path) {
        return (output_path.to_path_buf(), format);
    }
    let mut path = OsString::from(output_path.as_os_str());
    path.push(".");
    path.push(hint.suffix());
    (PathBuf::from(path), hint)
}
