//! Export polygon meshes to STL, VRML, OBJ, PLY and VTK polydata files.

pub mod aabb;
pub mod error;
pub mod format;
pub mod input;
pub mod nalgebra_types;
pub mod polymesh;
pub mod scene;
pub mod step;
pub mod writer;

pub use error::ExportError;
pub use format::{resolve_output, FileType, MeshFormat};
pub use polymesh::PolygonMesh;
pub use scene::{Actor, Colour, RenderWindow, Renderer, SurfaceProperty};
pub use step::{PolygonSerialiserStep, PortData, StepConfig, StepError};
pub use writer::{export, export_mesh, export_with, SurfaceWriter, Writer, WriterOptions};
