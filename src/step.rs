//! The polygon serialiser as a workflow step.
//!
//! The host hands the step points, faces and optionally a file name through
//! its ports, then calls `execute`. The only state kept between runs is the
//! small [`StepConfig`] document.

use crate::error::ExportError;
use crate::format::MeshFormat;
use crate::nalgebra_types::DMatrix;
use crate::writer::export;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const STEP_NAME: &str = "Polygon Serialiser";
pub const STEP_CATEGORY: &str = "Sink";

const PORT: &str = "http://physiomeproject.org/workflow/1.0/rdf-schema#port";
const USES: &str = "http://physiomeproject.org/workflow/1.0/rdf-schema#uses";

/// A port as (port, relation, data type) triple.
pub type Port = (&'static str, &'static str, &'static str);

/// The step's input ports in index order: points, faces, file name.
pub fn ports() -> [Port; 3] {
    [
        (
            PORT,
            USES,
            "http://physiomeproject.org/workflow/1.0/rdf-schema#pointcloud",
        ),
        (
            PORT,
            USES,
            "http://physiomeproject.org/workflow/1.0/rdf-schema#faces",
        ),
        (PORT, USES, "python#string"),
    ]
}

#[derive(Error, Debug)]
pub enum StepError {
    #[error("No {0} have been provided to the step")]
    MissingPortData(&'static str),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Invalid step configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Persisted step settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    #[serde(rename = "fileFormat")]
    pub file_format: String,
    #[serde(rename = "fileLoc")]
    pub file_loc: String,
}

impl Default for StepConfig {
    fn default() -> StepConfig {
        StepConfig {
            file_format: MeshFormat::Stl.suffix().to_string(),
            file_loc: String::new(),
        }
    }
}

impl StepConfig {
    /// A usable configuration names a supported format and an output location.
    pub fn is_valid(&self) -> bool {
        self.file_format.parse::<MeshFormat>().is_ok() && !self.file_loc.is_empty()
    }
}

// Keys missing from a stored document keep their current value
#[derive(Deserialize)]
struct StepConfigUpdate {
    #[serde(rename = "fileFormat")]
    file_format: Option<String>,
    #[serde(rename = "fileLoc")]
    file_loc: Option<String>,
}

/// Data arriving on one of the step's ports.
#[derive(Clone, Debug, PartialEq)]
pub enum PortData {
    Points(DMatrix<f64>),
    Faces(Vec<Vec<usize>>),
    FileLocation(String),
}

pub struct PolygonSerialiserStep {
    location: PathBuf,
    identifier: String,
    config: StepConfig,
    configured: bool,
    vertices: Option<DMatrix<f64>>,
    faces: Option<Vec<Vec<usize>>>,
    file_loc: Option<String>,
}

impl PolygonSerialiserStep {
    /// `location` is the workflow directory, relative output paths resolve
    /// against it.
    pub fn new<P: Into<PathBuf>>(location: P) -> PolygonSerialiserStep {
        PolygonSerialiserStep {
            location: location.into(),
            identifier: String::new(),
            config: StepConfig::default(),
            configured: false,
            vertices: None,
            faces: None,
            file_loc: None,
        }
    }

    pub fn name(&self) -> &'static str {
        STEP_NAME
    }

    pub fn category(&self) -> &'static str {
        STEP_CATEGORY
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn set_identifier<S: Into<String>>(&mut self, identifier: S) {
        self.identifier = identifier.into();
    }

    pub fn config(&self) -> &StepConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn validate(&self) -> bool {
        self.config.is_valid()
    }

    /// Replace the configuration, returns whether the step is now configured.
    pub fn configure(&mut self, config: StepConfig) -> bool {
        self.config = config;
        self.configured = self.validate();
        self.configured
    }

    pub fn set_port_data(&mut self, data: PortData) {
        match data {
            PortData::Points(points) => self.vertices = Some(points),
            PortData::Faces(faces) => self.faces = Some(faces),
            PortData::FileLocation(file_loc) => {
                self.config.file_loc = file_loc.clone();
                self.file_loc = Some(file_loc);
            }
        }
    }

    /// Where `execute` writes to, before the format suffix is resolved.
    pub fn output_path(&self) -> PathBuf {
        let file_loc = self.file_loc.as_ref().unwrap_or(&self.config.file_loc);
        // Absolute locations replace the workflow directory
        self.location.join(file_loc)
    }

    /// Export the port data, returns the file written.
    pub fn execute(&mut self) -> Result<PathBuf, StepError> {
        if !self.configured {
            warn!("{} executed before it was configured", STEP_NAME);
        }
        let vertices = self
            .vertices
            .as_ref()
            .ok_or(StepError::MissingPortData("points"))?;
        let faces = self
            .faces
            .as_ref()
            .ok_or(StepError::MissingPortData("faces"))?;

        let written = export(
            vertices,
            faces,
            &self.config.file_format,
            self.output_path(),
        )?;
        info!("{} wrote {}", STEP_NAME, written.display());
        Ok(written)
    }

    /// The configuration as a JSON document, keys sorted, four space indent.
    pub fn serialize(&self) -> Result<String, StepError> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.config.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Merge a stored JSON document into the configuration.
    pub fn deserialize(&mut self, document: &str) -> Result<(), StepError> {
        let update: StepConfigUpdate = serde_json::from_str(document)?;
        if let Some(file_format) = update.file_format {
            self.config.file_format = file_format;
        }
        if let Some(file_loc) = update.file_loc {
            self.config.file_loc = file_loc;
        }
        self.configured = self.validate();
        Ok(())
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::polymesh::PolygonMesh;

    fn tetrahedron() -> (DMatrix<f64>, Vec<Vec<usize>>) {
        let points = DMatrix::from_row_slice(
            4,
            3,
            &[
                0.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, //
                0.0, 0.0, 1.0,
            ],
        );
        let faces = vec![vec![0, 2, 1], vec![0, 1, 3], vec![0, 3, 2], vec![1, 2, 3]];
        (points, faces)
    }

    #[test]
    fn defaults() {
        let step = PolygonSerialiserStep::new("/workflow");
        assert_eq!(step.name(), "Polygon Serialiser");
        assert_eq!(step.category(), "Sink");
        assert_eq!(step.config().file_format, "stl");
        assert_eq!(step.config().file_loc, "");
        assert!(!step.is_configured());
        assert_eq!(ports().len(), 3);
        assert!(ports()[0].2.ends_with("#pointcloud"));
    }

    #[test]
    fn identifier() {
        let mut step = PolygonSerialiserStep::new("/workflow");
        assert_eq!(step.identifier(), "");
        step.set_identifier("serialiser1");
        assert_eq!(step.identifier(), "serialiser1");
    }

    #[test]
    fn configure_validates() {
        let mut step = PolygonSerialiserStep::new("/workflow");
        assert!(!step.configure(StepConfig {
            file_format: "xyz".to_string(),
            file_loc: "out".to_string(),
        }));
        assert!(!step.configure(StepConfig {
            file_format: "ply".to_string(),
            file_loc: String::new(),
        }));
        assert!(step.configure(StepConfig {
            file_format: "PLY".to_string(),
            file_loc: "out".to_string(),
        }));
        assert!(step.is_configured());
    }

    #[test]
    fn serialize_layout() {
        let mut step = PolygonSerialiserStep::new("/workflow");
        step.configure(StepConfig {
            file_format: "obj".to_string(),
            file_loc: "meshes/femur".to_string(),
        });
        assert_eq!(
            step.serialize().unwrap(),
            "{\n    \"fileFormat\": \"obj\",\n    \"fileLoc\": \"meshes/femur\"\n}"
        );
    }

    #[test]
    fn deserialize_merges() {
        let mut step = PolygonSerialiserStep::new("/workflow");
        step.deserialize(r#"{"fileLoc": "femur"}"#).unwrap();
        assert_eq!(step.config().file_format, "stl");
        assert_eq!(step.config().file_loc, "femur");
        assert!(step.is_configured());

        step.deserialize(r#"{"fileFormat": "wrl", "other": 1}"#).unwrap();
        assert_eq!(step.config().file_format, "wrl");
        assert_eq!(step.config().file_loc, "femur");
    }

    #[test]
    fn deserialize_round_trip() {
        let mut first = PolygonSerialiserStep::new("/workflow");
        first.configure(StepConfig {
            file_format: "vtp".to_string(),
            file_loc: "a/b".to_string(),
        });
        let mut second = PolygonSerialiserStep::new("/workflow");
        second.deserialize(&first.serialize().unwrap()).unwrap();
        assert_eq!(second.config(), first.config());
    }

    #[test]
    fn deserialize_rejects_garbage() {
        let mut step = PolygonSerialiserStep::new("/workflow");
        assert!(matches!(
            step.deserialize("not json"),
            Err(StepError::Config(_))
        ));
    }

    #[test]
    fn output_path_prefers_port() {
        let mut step = PolygonSerialiserStep::new("/workflow");
        step.configure(StepConfig {
            file_format: "stl".to_string(),
            file_loc: "configured".to_string(),
        });
        assert_eq!(step.output_path(), PathBuf::from("/workflow/configured"));

        step.set_port_data(PortData::FileLocation("from_port".to_string()));
        assert_eq!(step.output_path(), PathBuf::from("/workflow/from_port"));
        assert_eq!(step.config().file_loc, "from_port");

        step.set_port_data(PortData::FileLocation("/elsewhere/mesh".to_string()));
        assert_eq!(step.output_path(), PathBuf::from("/elsewhere/mesh"));
    }

    #[test]
    fn execute_without_data() {
        let mut step = PolygonSerialiserStep::new("/workflow");
        assert!(matches!(
            step.execute(),
            Err(StepError::MissingPortData("points"))
        ));
        let (points, _) = tetrahedron();
        step.set_port_data(PortData::Points(points));
        assert!(matches!(
            step.execute(),
            Err(StepError::MissingPortData("faces"))
        ));
    }

    #[test]
    fn execute_writes_configured_format() {
        let dir = tempdir::TempDir::new("step_execute").unwrap();
        let mut step = PolygonSerialiserStep::new(dir.path());
        step.configure(StepConfig {
            file_format: "ply".to_string(),
            file_loc: "tetrahedron".to_string(),
        });
        let (points, faces) = tetrahedron();
        step.set_port_data(PortData::Points(points));
        step.set_port_data(PortData::Faces(faces));

        let written = step.execute().unwrap();
        assert_eq!(written, dir.path().join("tetrahedron.ply"));
        let mesh: PolygonMesh<f64> = PolygonMesh::from_file(&written).unwrap();
        assert_eq!(mesh.node_len(), 4);
        assert_eq!(mesh.face_len(), 4);
    }

    #[test]
    fn execute_reports_unsupported_format() {
        let dir = tempdir::TempDir::new("step_unsupported").unwrap();
        let mut step = PolygonSerialiserStep::new(dir.path());
        step.configure(StepConfig {
            file_format: "xyz".to_string(),
            file_loc: "tetrahedron".to_string(),
        });
        let (points, faces) = tetrahedron();
        step.set_port_data(PortData::Points(points));
        step.set_port_data(PortData::Faces(faces));
        assert!(matches!(
            step.execute(),
            Err(StepError::Export(ExportError::UnsupportedFormat(_)))
        ));
    }
}
