pub mod obj;
pub mod ply;
pub mod polygon_mesh;
pub mod stl;
pub mod vrml;
pub mod vtk;

pub use obj::write_obj_file;
pub use ply::{read_ply_file, write_ply_file};
pub use polygon_mesh::PolygonMesh;
pub use stl::{read_stl_file, write_stl_file};
pub use vrml::write_vrml_file;
pub use vtk::{read_vtk_file, write_vtk_file};
