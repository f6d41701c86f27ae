//! Wavefront OBJ export of a render scene.
//!
//! Each actor becomes one group with its own material. Materials go to a
//! `.mtl` library written next to the `.obj` file.

use crate::nalgebra_types::*;
use crate::scene::{Actor, RenderWindow};
use std::ffi::OsString;
use std::io::{BufWriter, Result, Write};
use std::path::{Path, PathBuf};

fn write_material<W: Write, T: FloatField>(
    writer: &mut W,
    name: &str,
    actor: &Actor<T>,
) -> Result<()> {
    let property = &actor.property;
    let ambient = property.colour.scaled(property.ambient);
    let diffuse = property.colour.scaled(property.diffuse);
    writeln!(writer, "newmtl {}", name)?;
    writeln!(writer, "Ka {} {} {}", ambient.r, ambient.g, ambient.b)?;
    writeln!(writer, "Kd {} {} {}", diffuse.r, diffuse.g, diffuse.b)?;
    writeln!(
        writer,
        "Ks {} {} {}",
        property.specular, property.specular, property.specular
    )?;
    writeln!(writer, "Ns {}", property.specular_power)?;
    writeln!(writer, "d {}", property.opacity)?;
    writeln!(writer, "illum 3")?;
    writeln!(writer)
}

/// Write the scene as OBJ text to `obj_writer` and its materials to
/// `mtl_writer`. `mtl_name` is the library name referenced from the OBJ.
pub fn write_obj<O, M, T>(
    obj_writer: &mut O,
    mtl_writer: &mut M,
    mtl_name: &str,
    window: &RenderWindow<T>,
) -> Result<()>
where
    O: Write,
    M: Write,
    T: FloatField,
{
    let mut obj = BufWriter::new(obj_writer);
    let mut mtl = BufWriter::new(mtl_writer);

    writeln!(obj, "# wavefront obj file written by polygon_serialiser")?;
    writeln!(obj, "mtllib {}", mtl_name)?;
    writeln!(mtl, "# wavefront mtl file written by polygon_serialiser")?;

    // OBJ indices are 1-based and global over the whole file
    let mut index_offset = 1;
    for (i, actor) in window.actors().enumerate() {
        let material = format!("mtl{}", i + 1);
        write_material(&mut mtl, &material, actor)?;

        let mesh = actor.mesh();
        writeln!(obj)?;
        for p in mesh.nodes() {
            writeln!(obj, "v {} {} {}", p.x.as_f64(), p.y.as_f64(), p.z.as_f64())?;
        }
        writeln!(obj, "g grp{}", i + 1)?;
        writeln!(obj, "usemtl {}", material)?;
        for face in mesh.faces() {
            write!(obj, "f")?;
            for n in face {
                write!(obj, " {}", n + index_offset)?;
            }
            writeln!(obj)?;
        }
        index_offset += mesh.node_len();
    }

    obj.flush()?;
    mtl.flush()
}

/// The `.obj` and `.mtl` paths for an output path. A path without an `.obj`
/// extension is used as the prefix of both.
pub fn obj_file_paths(path: &Path) -> (PathBuf, PathBuf) {
    let is_obj = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("obj"));
    if is_obj {
        return (path.to_path_buf(), path.with_extension("mtl"));
    }
    let mut obj = OsString::from(path.as_os_str());
    obj.push(".obj");
    let mut mtl = OsString::from(path.as_os_str());
    mtl.push(".mtl");
    (PathBuf::from(obj), PathBuf::from(mtl))
}

pub fn write_obj_file<P: AsRef<Path>, T: FloatField>(
    path: &P,
    window: &RenderWindow<T>,
) -> Result<()> {
    let (obj_path, mtl_path) = obj_file_paths(path.as_ref());
    let mtl_name = mtl_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut obj_file = std::fs::File::create(&obj_path)?;
    let mut mtl_file = std::fs::File::create(&mtl_path)?;
    write_obj(&mut obj_file, &mut mtl_file, &mtl_name, window)
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::polymesh::PolygonMesh;
    use crate::scene::{Colour, Renderer};

    fn square() -> PolygonMesh<f64> {
        let points = DMatrix::from_row_slice(
            4,
            3,
            &[
                0.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, //
                1.0, 1.0, 0.0, //
                0.0, 1.0, 0.0,
            ],
        );
        PolygonMesh::from_arrays(&points, &[vec![0usize, 1, 2, 3]]).unwrap()
    }

    fn export(window: &RenderWindow<f64>) -> (String, String) {
        let mut obj = Vec::<u8>::new();
        let mut mtl = Vec::<u8>::new();
        write_obj(&mut obj, &mut mtl, "mesh.mtl", window).unwrap();
        (String::from_utf8(obj).unwrap(), String::from_utf8(mtl).unwrap())
    }

    #[test]
    fn single_actor() {
        let mesh = square();
        let (obj, mtl) = export(&RenderWindow::for_mesh(&mesh, None));

        assert!(obj.contains("mtllib mesh.mtl\n"));
        assert_eq!(obj.lines().filter(|l| l.starts_with("v ")).count(), 4);
        assert!(obj.contains("v 1 1 0\n"));
        assert!(obj.contains("g grp1\nusemtl mtl1\nf 1 2 3 4\n"));

        assert!(mtl.contains("newmtl mtl1\n"));
        assert!(mtl.contains("Kd 1 1 1\n"));
    }

    #[test]
    fn actors_offset_indices() {
        let mesh = square();
        let mut window = RenderWindow::for_mesh(&mesh, Some(Colour::new(1.0, 0.0, 0.0)));
        let mut renderer = Renderer::new();
        renderer.add_actor(Actor::new(&mesh));
        window.add_renderer(renderer);

        let (obj, mtl) = export(&window);
        assert_eq!(obj.lines().filter(|l| l.starts_with("v ")).count(), 8);
        assert!(obj.contains("g grp2\nusemtl mtl2\nf 5 6 7 8\n"));
        assert!(mtl.contains("newmtl mtl1\nKa 0 0 0\nKd 1 0 0\n"));
        assert!(mtl.contains("newmtl mtl2\n"));
    }

    #[test]
    fn file_paths() {
        let (obj, mtl) = obj_file_paths(Path::new("out/mesh.OBJ"));
        assert_eq!(obj, PathBuf::from("out/mesh.OBJ"));
        assert_eq!(mtl, PathBuf::from("out/mesh.mtl"));

        let (obj, mtl) = obj_file_paths(Path::new("out/mesh.v2"));
        assert_eq!(obj, PathBuf::from("out/mesh.v2.obj"));
        assert_eq!(mtl, PathBuf::from("out/mesh.v2.mtl"));
    }

    #[test]
    fn to_file() {
        let dir = tempdir::TempDir::new("obj_to_file_test").unwrap();
        let path = dir.path().join("square.obj");
        let mesh = square();
        write_obj_file(&path, &RenderWindow::for_mesh(&mesh, None)).unwrap();

        let obj = std::fs::read_to_string(&path).unwrap();
        assert!(obj.contains("mtllib square.mtl"));
        assert!(dir.path().join("square.mtl").exists());
    }
}
