use crate::aabb::AABB;
use crate::error::ExportError;
use crate::nalgebra_types::*;
use crate::polymesh::ply::*;
use crate::polymesh::stl::*;
use crate::polymesh::vtk::*;
use anyhow::{anyhow, Context};

/// Polygon Mesh class.
/// Tracks face -> node topology, faces may have any number of nodes.
/// Once built it is never mutated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolygonMesh<T: FloatField> {
    node_positions: Vec<SVector<T, 3>>,
    face_indices: Vec<Vec<usize>>,
}

impl<T: FloatField> PolygonMesh<T> {
    pub(crate) fn new() -> PolygonMesh<T> {
        PolygonMesh {
            node_positions: Vec::new(),
            face_indices: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(node_len: usize, face_len: usize) -> PolygonMesh<T> {
        PolygonMesh {
            node_positions: Vec::with_capacity(node_len),
            face_indices: Vec::with_capacity(face_len),
        }
    }

    /// Build a mesh from an N x 3 matrix of point coordinates and a list of
    /// faces, each face being the ordered node indices of one polygon.
    pub fn from_arrays<F: AsRef<[usize]>>(
        points: &DMatrix<T>,
        faces: &[F],
    ) -> Result<PolygonMesh<T>, ExportError> {
        if points.ncols() != 3 {
            return Err(ExportError::InvalidGeometryShape(format!(
                "v array must be of shape [n, 3], got [{}, {}]",
                points.nrows(),
                points.ncols()
            )));
        }

        let mut result = PolygonMesh::with_capacity(points.nrows(), faces.len());
        for row in points.row_iter() {
            result.add_node(vector![row[0], row[1], row[2]]);
        }

        for (f, face) in faces.iter().enumerate() {
            let face = face.as_ref();
            if face.is_empty() {
                return Err(ExportError::InvalidGeometryShape(format!(
                    "face {} has no vertex indices",
                    f
                )));
            }
            if let Some(&bad) = face.iter().find(|&&n| n >= result.node_len()) {
                return Err(ExportError::InvalidGeometryShape(format!(
                    "face {} references vertex {} but there are only {} vertices",
                    f,
                    bad,
                    result.node_len()
                )));
            }
            result.add_face(face.to_vec());
        }

        Ok(result)
    }

    /// Same as `from_arrays`, reading each row of `faces` as one face.
    pub fn from_matrices(
        points: &DMatrix<T>,
        faces: &DMatrix<usize>,
    ) -> Result<PolygonMesh<T>, ExportError> {
        let rows: Vec<Vec<usize>> = faces
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect();
        PolygonMesh::from_arrays(points, &rows)
    }

    /// Read a PolygonMesh from file.
    /// `.ply`, `.stl` and legacy VTK (`.vtk`, `.vtp`) files are supported.
    pub fn from_file<P: AsRef<std::path::Path>>(p: &P) -> anyhow::Result<PolygonMesh<T>> {
        let path: &std::path::Path = p.as_ref();
        let maybe_extension = path.extension();

        let extension = match maybe_extension {
            Some(ext) => ext
                .to_str()
                .with_context(|| {
                    format!(
                        "Failed to convert file extension to str: {}",
                        path.display()
                    )
                })?
                .to_lowercase(),
            None => {
                return Err(anyhow!(
                    "No extension on PolygonMesh file: {}",
                    path.display()
                ));
            }
        };

        match extension.as_str() {
            "stl" => read_stl_file(p)
                .with_context(|| format!("Failed to read stl file: {}", path.display())),
            "ply" => read_ply_file(p)
                .with_context(|| format!("Failed to read ply file: {}", path.display())),
            "vtk" | "vtp" => read_vtk_file(p)
                .with_context(|| format!("Failed to read vtk file: {}", path.display())),
            ext => Err(anyhow!(format!(
                "Unknown file type for PolygonMesh: {}",
                ext
            ))),
        }
    }

    pub fn node_len(&self) -> usize {
        self.node_positions.len()
    }

    pub fn face_len(&self) -> usize {
        self.face_indices.len()
    }

    pub(crate) fn add_node(&mut self, position: SVector<T, 3>) -> usize {
        let result = self.node_len();
        self.node_positions.push(position);
        result
    }

    pub fn node(&self, index: usize) -> &SVector<T, 3> {
        &self.node_positions[index]
    }

    pub fn nodes(&self) -> &[SVector<T, 3>] {
        &self.node_positions
    }

    pub(crate) fn add_face(&mut self, indices: Vec<usize>) -> usize {
        let result = self.face_len();
        self.face_indices.push(indices);
        result
    }

    pub fn face(&self, index: usize) -> &[usize] {
        &self.face_indices[index]
    }

    pub fn faces(&self) -> &[Vec<usize>] {
        &self.face_indices
    }

    /// Total number of node references over all faces.
    pub fn connectivity_len(&self) -> usize {
        self.face_indices.iter().map(|f| f.len()).sum()
    }

    /// Split a face into a triangle fan around its first node.
    /// Faces with fewer than three nodes give no triangles.
    pub fn triangle_fan(&self, index: usize) -> impl Iterator<Item = [usize; 3]> + '_ {
        let face = self.face(index);
        (2..face.len()).map(move |i| [face[0], face[i - 1], face[i]])
    }

    /// Unit normal of a face by Newell's method.
    /// Degenerate faces give the zero vector.
    pub fn face_normal(&self, index: usize) -> SVector<T, 3> {
        let face = self.face(index);
        let mut normal: SVector<T, 3> = SVector::zero();
        for (i, &n) in face.iter().enumerate() {
            let next = face[(i + 1) % face.len()];
            normal += self.node(n).cross(self.node(next));
        }
        let length = normal.norm();
        if length > T::zero() {
            normal / length
        } else {
            SVector::zero()
        }
    }

    pub fn bounds(&self) -> Option<AABB<T, 3>> {
        AABB::enclosing(self.node_positions.iter())
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    fn square_points() -> DMatrix<f64> {
        DMatrix::from_row_slice(
            4,
            3,
            &[
                0.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, //
                1.0, 1.0, 0.0, //
                0.0, 1.0, 0.0,
            ],
        )
    }

    #[test]
    fn empty_mesh() {
        let m = PolygonMesh::<f64>::new();
        assert_eq!(m.node_len(), 0);
        assert_eq!(m.face_len(), 0);
        assert!(m.bounds().is_none());
    }

    #[test]
    fn from_arrays_keeps_order() {
        let m = PolygonMesh::from_arrays(&square_points(), &[vec![0usize, 1, 2, 3]]).unwrap();
        assert_eq!(m.node_len(), 4);
        assert_eq!(m.face_len(), 1);
        assert_eq!(*m.node(2), vector![1.0, 1.0, 0.0]);
        assert_eq!(m.face(0), &[0, 1, 2, 3]);
        assert_eq!(m.connectivity_len(), 4);
    }

    #[test]
    fn from_arrays_variable_length_faces() {
        let faces: Vec<Vec<usize>> = vec![vec![0, 1, 2], vec![0, 2, 3], vec![3, 2, 1, 0]];
        let m = PolygonMesh::from_arrays(&square_points(), &faces).unwrap();
        assert_eq!(m.face_len(), 3);
        assert_eq!(m.connectivity_len(), 10);
    }

    #[test]
    fn from_arrays_fixed_size_faces() {
        let m = PolygonMesh::from_arrays(&square_points(), &[[0usize, 1, 2], [0, 2, 3]]).unwrap();
        assert_eq!(m.face_len(), 2);
        assert_eq!(m.face(1), &[0, 2, 3]);
    }

    #[test]
    fn from_matrices_rows_are_faces() {
        let faces = DMatrix::from_row_slice(2, 3, &[0usize, 1, 2, 0, 2, 3]);
        let m = PolygonMesh::from_matrices(&square_points(), &faces).unwrap();
        assert_eq!(m.face_len(), 2);
        assert_eq!(m.face(0), &[0, 1, 2]);
        assert_eq!(m.face(1), &[0, 2, 3]);
    }

    #[test]
    fn two_columns_is_invalid() {
        for n in 0..5 {
            let points = DMatrix::<f64>::zeros(n, 2);
            let faces: Vec<Vec<usize>> = Vec::new();
            let result = PolygonMesh::from_arrays(&points, &faces);
            assert!(matches!(
                result,
                Err(ExportError::InvalidGeometryShape(_))
            ));
        }
    }

    #[test]
    fn out_of_range_index_is_invalid() {
        let result = PolygonMesh::from_arrays(&square_points(), &[vec![0usize, 1, 4]]);
        assert!(matches!(result, Err(ExportError::InvalidGeometryShape(_))));
    }

    #[test]
    fn empty_face_is_invalid() {
        let result = PolygonMesh::from_arrays(&square_points(), &[vec![0usize, 1, 2], vec![]]);
        assert!(matches!(result, Err(ExportError::InvalidGeometryShape(_))));
    }

    #[test]
    fn triangle_fan() {
        let m = PolygonMesh::from_arrays(&square_points(), &[vec![0usize, 1, 2, 3], vec![0, 1]])
            .unwrap();
        let fan: Vec<[usize; 3]> = m.triangle_fan(0).collect();
        assert_eq!(fan, vec![[0usize, 1, 2], [0, 2, 3]]);
        assert_eq!(m.triangle_fan(1).count(), 0);
    }

    #[test]
    fn face_normal() {
        let m = PolygonMesh::from_arrays(&square_points(), &[vec![0usize, 1, 2, 3], vec![0, 3, 2]])
            .unwrap();
        assert_eq!(m.face_normal(0), vector![0.0, 0.0, 1.0]);
        assert_eq!(m.face_normal(1), vector![0.0, 0.0, -1.0]);
    }

    #[test]
    fn degenerate_face_normal_is_zero() {
        let m = PolygonMesh::from_arrays(&square_points(), &[vec![0usize, 1, 1]]).unwrap();
        assert_eq!(m.face_normal(0), vector![0.0, 0.0, 0.0]);
    }

    #[test]
    fn bounds() {
        let m = PolygonMesh::from_arrays(&square_points(), &[vec![0usize, 1, 2]]).unwrap();
        let b = m.bounds().unwrap();
        assert_eq!(*b.min(), vector![0.0, 0.0, 0.0]);
        assert_eq!(*b.max(), vector![1.0, 1.0, 0.0]);
    }

    #[test]
    fn from_file_unknown_extension() {
        let result = PolygonMesh::<f64>::from_file(&"mesh.xyz");
        assert!(result.is_err());
        let result = PolygonMesh::<f64>::from_file(&"mesh");
        assert!(result.is_err());
    }
}
