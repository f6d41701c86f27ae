//! Loading meshes handed to the command line tool.

use crate::error::ExportError;
use crate::nalgebra_types::*;
use crate::polymesh::PolygonMesh;
use anyhow::Context;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A mesh as plain JSON arrays: `{"points": [[x, y, z], ...], "faces": [[i, ...], ...]}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshDocument {
    pub points: Vec<Vec<f64>>,
    pub faces: Vec<Vec<usize>>,
}

impl MeshDocument {
    pub fn from_json(json: &str) -> serde_json::Result<MeshDocument> {
        serde_json::from_str(json)
    }

    /// The points as an N x K matrix. Every row must have the same length,
    /// the builder checks that it is 3.
    pub fn points_matrix(&self) -> Result<DMatrix<f64>, ExportError> {
        let ncols = self.points.first().map_or(3, |row| row.len());
        if let Some((r, row)) = self
            .points
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != ncols)
        {
            return Err(ExportError::InvalidGeometryShape(format!(
                "point {} has {} coordinates, expected {}",
                r,
                row.len(),
                ncols
            )));
        }
        Ok(DMatrix::from_row_iterator(
            self.points.len(),
            ncols,
            self.points.iter().flatten().copied(),
        ))
    }

    pub fn to_mesh(&self) -> Result<PolygonMesh<f64>, ExportError> {
        PolygonMesh::from_arrays(&self.points_matrix()?, &self.faces)
    }
}

/// Load a mesh from a JSON mesh document or any mesh file the crate reads.
pub fn load_mesh(path: &Path) -> anyhow::Result<PolygonMesh<f64>> {
    info!("Loading mesh from {}", path.display());
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("json"));

    let mesh = if is_json {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let document = MeshDocument::from_json(&json)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        document.to_mesh()?
    } else {
        PolygonMesh::from_file(&path)?
    };
    debug!("Loaded {} vertices, {} faces", mesh.node_len(), mesh.face_len());
    Ok(mesh)
}
