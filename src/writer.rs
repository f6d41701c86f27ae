use crate::error::ExportError;
use crate::format::{resolve_output, FileType, MeshFormat};
use crate::nalgebra_types::*;
use crate::polymesh::*;
use crate::scene::{Colour, RenderWindow};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// What a writer is handed: raw geometry or a scene holding it.
pub enum Surface<'s, 'a, T: FloatField> {
    Geometry(&'s PolygonMesh<T>),
    Scene(&'s RenderWindow<'a, T>),
}

impl<'s, 'a, T: FloatField> Surface<'s, 'a, T> {
    /// The mesh to write for the geometry formats, the first actor's for a
    /// scene.
    pub fn geometry(&self) -> std::io::Result<&PolygonMesh<T>> {
        match self {
            Surface::Geometry(mesh) => Ok(*mesh),
            Surface::Scene(window) => window.actors().next().map(|a| a.mesh()).ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "scene has no actors")
            }),
        }
    }
}

/// Serialises a surface to one file format.
pub trait SurfaceWriter<T: FloatField> {
    fn write_surface(&self, surface: &Surface<T>, path: &Path) -> std::io::Result<()>;
}

pub struct StlWriter {
    pub file_type: FileType,
}

impl<T: FloatField> SurfaceWriter<T> for StlWriter {
    fn write_surface(&self, surface: &Surface<T>, path: &Path) -> std::io::Result<()> {
        write_stl_file(&path, surface.geometry()?, self.file_type.is_ascii())
    }
}

pub struct PlyWriter {
    pub file_type: FileType,
    pub colour: Option<Colour>,
}

impl<T: FloatField> SurfaceWriter<T> for PlyWriter {
    fn write_surface(&self, surface: &Surface<T>, path: &Path) -> std::io::Result<()> {
        write_ply_file(
            &path,
            surface.geometry()?,
            self.file_type.is_ascii(),
            self.colour.as_ref(),
        )
    }
}

/// Writes legacy VTK polydata.
pub struct VtkWriter {
    pub file_type: FileType,
}

impl<T: FloatField> SurfaceWriter<T> for VtkWriter {
    fn write_surface(&self, surface: &Surface<T>, path: &Path) -> std::io::Result<()> {
        write_vtk_file(&path, surface.geometry()?, self.file_type.is_ascii())
    }
}

pub struct ObjExporter {
    pub colour: Option<Colour>,
}

impl<T: FloatField> SurfaceWriter<T> for ObjExporter {
    fn write_surface(&self, surface: &Surface<T>, path: &Path) -> std::io::Result<()> {
        match surface {
            Surface::Scene(window) => write_obj_file(&path, window),
            Surface::Geometry(mesh) => {
                write_obj_file(&path, &RenderWindow::for_mesh(mesh, self.colour))
            }
        }
    }
}

pub struct VrmlExporter {
    pub colour: Option<Colour>,
}

impl<T: FloatField> SurfaceWriter<T> for VrmlExporter {
    fn write_surface(&self, surface: &Surface<T>, path: &Path) -> std::io::Result<()> {
        match surface {
            Surface::Scene(window) => write_vrml_file(&path, window),
            Surface::Geometry(mesh) => {
                write_vrml_file(&path, &RenderWindow::for_mesh(mesh, self.colour))
            }
        }
    }
}

impl MeshFormat {
    pub fn surface_writer<T: FloatField>(&self, options: &WriterOptions) -> Box<dyn SurfaceWriter<T>> {
        match self {
            MeshFormat::Stl => Box::new(StlWriter {
                file_type: options.file_type,
            }),
            MeshFormat::Ply => Box::new(PlyWriter {
                file_type: options.file_type,
                colour: options.colour,
            }),
            MeshFormat::Vtp => Box::new(VtkWriter {
                file_type: options.file_type,
            }),
            MeshFormat::Obj => Box::new(ObjExporter {
                colour: options.colour,
            }),
            MeshFormat::Wrl => Box::new(VrmlExporter {
                colour: options.colour,
            }),
        }
    }
}

/// Settings shared by every writer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriterOptions {
    pub filename: Option<PathBuf>,
    /// Actor colour for the scene formats, uniform face colour for PLY.
    pub colour: Option<Colour>,
    pub file_type: FileType,
}

/// Writes one mesh to any of the supported formats.
pub struct Writer<'a, T: FloatField> {
    mesh: &'a PolygonMesh<T>,
    render_window: Option<RenderWindow<'a, T>>,
    window_supplied: bool,
    options: WriterOptions,
}

impl<'a, T: FloatField> Writer<'a, T> {
    pub fn new(mesh: &'a PolygonMesh<T>) -> Writer<'a, T> {
        Writer {
            mesh,
            render_window: None,
            window_supplied: false,
            options: WriterOptions::default(),
        }
    }

    /// A scene built from earlier options is dropped so the new colour is used.
    pub fn with_options(mut self, options: WriterOptions) -> Writer<'a, T> {
        self.options = options;
        if !self.window_supplied {
            self.render_window = None;
        }
        self
    }

    /// Use this scene for OBJ and VRML instead of building one.
    pub fn with_render_window(mut self, window: RenderWindow<'a, T>) -> Writer<'a, T> {
        self.render_window = Some(window);
        self.window_supplied = true;
        self
    }

    pub fn set_filename<P: Into<PathBuf>>(&mut self, filename: P) {
        self.options.filename = Some(filename.into());
    }

    fn render_window(&mut self) -> &RenderWindow<'a, T> {
        let mesh = self.mesh;
        let colour = self.options.colour;
        self.render_window
            .get_or_insert_with(|| RenderWindow::for_mesh(mesh, colour))
    }

    /// Write to `filename`, or the configured filename, in the format its
    /// extension names.
    pub fn write(&mut self, filename: Option<&Path>) -> Result<(), ExportError> {
        if let Some(filename) = filename {
            self.set_filename(filename);
        }
        let path = self
            .options
            .filename
            .clone()
            .ok_or_else(|| ExportError::UnsupportedFormat("no filename given".to_string()))?;
        let format = MeshFormat::from_path(&path).ok_or_else(|| {
            ExportError::UnsupportedFormat(
                path.extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            )
        })?;
        self.write_format(format, &path)
    }

    /// Write `format` to `path` whatever the path's extension is.
    pub fn write_format(&mut self, format: MeshFormat, path: &Path) -> Result<(), ExportError> {
        debug!("writing {} as {} ({:?})", path.display(), format, self.options.file_type);
        let writer = format.surface_writer::<T>(&self.options);
        let mesh = self.mesh;
        let surface = if format.requires_scene() {
            Surface::Scene(self.render_window())
        } else {
            Surface::Geometry(mesh)
        };
        writer
            .write_surface(&surface, path)
            .map_err(|e| ExportError::write_failure(path, e))
    }

    pub fn write_stl(&mut self, path: &Path) -> Result<(), ExportError> {
        self.write_format(MeshFormat::Stl, path)
    }

    pub fn write_ply(&mut self, path: &Path) -> Result<(), ExportError> {
        self.write_format(MeshFormat::Ply, path)
    }

    pub fn write_vtp(&mut self, path: &Path) -> Result<(), ExportError> {
        self.write_format(MeshFormat::Vtp, path)
    }

    pub fn write_obj(&mut self, path: &Path) -> Result<(), ExportError> {
        self.write_format(MeshFormat::Obj, path)
    }

    pub fn write_vrml(&mut self, path: &Path) -> Result<(), ExportError> {
        self.write_format(MeshFormat::Wrl, path)
    }
}

/// Export an N x 3 point matrix and its faces as ASCII.
/// Returns the path actually written.
pub fn export<T, F, P>(
    points: &DMatrix<T>,
    faces: &[F],
    format_hint: &str,
    output_path: P,
) -> Result<PathBuf, ExportError>
where
    T: FloatField,
    F: AsRef<[usize]>,
    P: AsRef<Path>,
{
    export_with(points, faces, format_hint, output_path, &WriterOptions::default())
}

/// `export` with explicit writer options. The options' filename is replaced
/// by the resolved output path.
pub fn export_with<T, F, P>(
    points: &DMatrix<T>,
    faces: &[F],
    format_hint: &str,
    output_path: P,
    options: &WriterOptions,
) -> Result<PathBuf, ExportError>
where
    T: FloatField,
    F: AsRef<[usize]>,
    P: AsRef<Path>,
{
    let mesh = PolygonMesh::from_arrays(points, faces)?;
    export_mesh(&mesh, format_hint, output_path, options)
}

pub fn export_mesh<T, P>(
    mesh: &PolygonMesh<T>,
    format_hint: &str,
    output_path: P,
    options: &WriterOptions,
) -> Result<PathBuf, ExportError>
where
    T: FloatField,
    P: AsRef<Path>,
{
    let hint: MeshFormat = format_hint.parse()?;
    let (path, format) = resolve_output(output_path.as_ref(), hint);

    info!(
        "writing {} vertices and {} faces to {}",
        mesh.node_len(),
        mesh.face_len(),
        path.display()
    );
    info!("suffix: {}", format);
    if let Some(bounds) = mesh.bounds() {
        let dims = bounds.diagonal();
        debug!(
            "Dimensions: {:.3} x {:.3} x {:.3}",
            dims.x.as_f64(),
            dims.y.as_f64(),
            dims.z.as_f64()
        );
    }

    let options = WriterOptions {
        filename: Some(path.clone()),
        ..options.clone()
    };
    Writer::new(mesh)
        .with_options(options)
        .write_format(format, &path)?;
    Ok(path)
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::scene::Actor;
    use crate::scene::Renderer;

    fn triangle() -> PolygonMesh<f64> {
        let points = DMatrix::from_row_slice(3, 3, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        PolygonMesh::from_arrays(&points, &[[0usize, 1, 2]]).unwrap()
    }

    #[test]
    fn write_dispatches_on_extension() {
        let dir = tempdir::TempDir::new("writer_dispatch").unwrap();
        let mesh = triangle();
        let mut writer = Writer::new(&mesh);
        for format in MeshFormat::ALL {
            let path = dir.path().join(format!("triangle.{}", format.suffix().to_uppercase()));
            writer.write(Some(path.as_path())).unwrap();
            assert!(std::fs::metadata(&path).unwrap().len() > 0, "{}", format);
        }
        assert!(dir.path().join("triangle.mtl").exists());
    }

    #[test]
    fn write_without_filename() {
        let mesh = triangle();
        let result = Writer::new(&mesh).write(None);
        assert!(matches!(result, Err(ExportError::UnsupportedFormat(_))));
    }

    #[test]
    fn write_unknown_extension() {
        let dir = tempdir::TempDir::new("writer_unknown").unwrap();
        let path = dir.path().join("triangle.xyz");
        let mesh = triangle();
        let result = Writer::new(&mesh).write(Some(path.as_path()));
        assert!(matches!(result, Err(ExportError::UnsupportedFormat(ref s)) if s == "xyz"));
        assert!(!path.exists());
    }

    #[test]
    fn render_window_is_built_once() {
        let dir = tempdir::TempDir::new("writer_window").unwrap();
        let mesh = triangle();
        let mut writer = Writer::new(&mesh);
        assert!(writer.render_window.is_none());
        writer.write_obj(&dir.path().join("a.obj")).unwrap();
        assert!(writer.render_window.is_some());
        writer.write_vrml(&dir.path().join("a.wrl")).unwrap();
        assert_eq!(writer.render_window().actors().count(), 1);
    }

    #[test]
    fn new_options_rebuild_render_window() {
        let dir = tempdir::TempDir::new("writer_new_options").unwrap();
        let mesh = triangle();
        let path = dir.path().join("triangle.wrl");
        let mut writer = Writer::new(&mesh).with_options(WriterOptions {
            colour: Some(Colour::new(1.0, 0.0, 0.0)),
            ..WriterOptions::default()
        });
        writer.write_vrml(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("diffuseColor 1 0 0\n"));

        let mut writer = writer.with_options(WriterOptions {
            colour: Some(Colour::new(0.0, 0.0, 1.0)),
            ..WriterOptions::default()
        });
        writer.write_vrml(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("diffuseColor 0 0 1\n"));
    }

    #[test]
    fn options_keep_supplied_render_window() {
        let mesh = triangle();
        let mut window = RenderWindow::for_mesh(&mesh, None);
        window.add_renderer(Renderer::new());
        let mut writer = Writer::new(&mesh)
            .with_render_window(window)
            .with_options(WriterOptions::default());
        assert_eq!(writer.render_window().renderers().len(), 2);
    }

    #[test]
    fn supplied_render_window_is_used() {
        let dir = tempdir::TempDir::new("writer_supplied_window").unwrap();
        let mesh = triangle();
        let mut window = RenderWindow::for_mesh(&mesh, None);
        let mut renderer = Renderer::new();
        renderer.add_actor(Actor::new(&mesh));
        window.add_renderer(renderer);

        let path = dir.path().join("two.wrl");
        Writer::new(&mesh)
            .with_render_window(window)
            .write_vrml(&path)
            .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("Shape {").count(), 2);
    }

    #[test]
    fn geometry_writer_takes_first_actor_of_a_scene() {
        let dir = tempdir::TempDir::new("writer_scene_geometry").unwrap();
        let mesh = triangle();
        let window = RenderWindow::for_mesh(&mesh, None);
        let path = dir.path().join("scene.stl");
        let writer: Box<dyn SurfaceWriter<f64>> =
            MeshFormat::Stl.surface_writer(&WriterOptions::default());
        writer.write_surface(&Surface::Scene(&window), &path).unwrap();
        let read: PolygonMesh<f64> = read_stl_file(&path).unwrap();
        assert_eq!(read.face_len(), 1);

        let empty = RenderWindow::<f64>::new();
        let result = writer.write_surface(&Surface::Scene(&empty), &path);
        assert_eq!(
            result.err().unwrap().kind(),
            std::io::ErrorKind::InvalidInput
        );
    }

    #[test]
    fn unwritable_path_is_write_failure() {
        let dir = tempdir::TempDir::new("writer_failure").unwrap();
        let path = dir.path().join("missing").join("triangle.ply");
        let mesh = triangle();
        let result = Writer::new(&mesh).write_ply(&path);
        match result {
            Err(ExportError::WriteFailure { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected WriteFailure, got {:?}", other),
        }
    }

    #[test]
    fn export_mesh_resolves_path() {
        let dir = tempdir::TempDir::new("writer_export_mesh").unwrap();
        let mesh = triangle();
        let written = export_mesh(
            &mesh,
            "PLY",
            dir.path().join("triangle"),
            &WriterOptions::default(),
        )
        .unwrap();
        assert_eq!(written, dir.path().join("triangle.ply"));
        assert!(written.exists());
    }
}
