use crate::nalgebra_types::*;
use crate::polymesh::PolygonMesh;
use crate::scene::Colour;
use ply_rs::parser;
use ply_rs::ply;
use ply_rs::ply::Addable;
use ply_rs::writer;
use std::io::{BufReader, BufWriter, Write};

struct VertexWrapper<T: FloatField>(SVector<T, 3>);

struct FaceWrapper(Vec<usize>);

impl<T: FloatField> ply::PropertyAccess for VertexWrapper<T> {
    fn new() -> Self {
        VertexWrapper(SVector::zeros())
    }

    fn set_property(&mut self, key: String, property: ply::Property) {
        let value = match property {
            ply::Property::Float(v) => T::frm_f32(v),
            ply::Property::Double(v) => T::frm_f64(v),
            // Normals, colours and anything else we do not keep
            _ => return,
        };
        match key.as_ref() {
            "x" => self.0.x = value,
            "y" => self.0.y = value,
            "z" => self.0.z = value,
            _ => {}
        }
    }
}

// same thing for Face
impl ply::PropertyAccess for FaceWrapper {
    fn new() -> Self {
        FaceWrapper(Vec::new())
    }
    fn set_property(&mut self, key: String, property: ply::Property) {
        if key != "vertex_indices" && key != "vertex_index" {
            return;
        }
        match property {
            ply::Property::ListInt(vec) => self.0 = vec.iter().map(|&i| i as usize).collect(),
            ply::Property::ListUInt(vec) => self.0 = vec.iter().map(|&i| i as usize).collect(),
            _ => {}
        }
    }
}

fn scalar_property(name: &str, scalar: ply::ScalarType) -> ply::PropertyDef {
    ply::PropertyDef::new(name.to_string(), ply::PropertyType::Scalar(scalar))
}

/// Smallest list count type that holds the longest face.
fn face_count_type<T: FloatField>(mesh: &PolygonMesh<T>) -> ply::ScalarType {
    let longest = mesh.faces().iter().map(|f| f.len()).max().unwrap_or(0);
    if longest <= u8::MAX as usize {
        ply::ScalarType::UChar
    } else if longest <= u16::MAX as usize {
        ply::ScalarType::UShort
    } else {
        ply::ScalarType::UInt
    }
}

/// Build the ply document for a mesh.
/// Binary output is always little endian. A colour is written as a uniform
/// per face colour.
fn mesh_to_ply<T: FloatField>(
    mesh: &PolygonMesh<T>,
    ascii: bool,
    colour: Option<&Colour>,
) -> ply::Ply<ply::DefaultElement> {
    let mut ply = ply::Ply::<ply::DefaultElement>::new();
    ply.header.encoding = if ascii {
        ply::Encoding::Ascii
    } else {
        ply::Encoding::BinaryLittleEndian
    };
    ply.header
        .comments
        .push("written by polygon_serialiser".to_string());

    let mut vertex_def = ply::ElementDef::new("vertex".to_string());
    for name in ["x", "y", "z"] {
        vertex_def
            .properties
            .add(scalar_property(name, ply::ScalarType::Float));
    }
    ply.header.elements.add(vertex_def);

    let mut face_def = ply::ElementDef::new("face".to_string());
    face_def.properties.add(ply::PropertyDef::new(
        "vertex_indices".to_string(),
        ply::PropertyType::List(face_count_type(mesh), ply::ScalarType::Int),
    ));
    if colour.is_some() {
        for name in ["red", "green", "blue"] {
            face_def
                .properties
                .add(scalar_property(name, ply::ScalarType::UChar));
        }
    }
    ply.header.elements.add(face_def);

    let vertices: Vec<ply::DefaultElement> = mesh
        .nodes()
        .iter()
        .map(|p| {
            let mut element = ply::DefaultElement::new();
            element.insert("x".to_string(), ply::Property::Float(p.x.as_f32()));
            element.insert("y".to_string(), ply::Property::Float(p.y.as_f32()));
            element.insert("z".to_string(), ply::Property::Float(p.z.as_f32()));
            element
        })
        .collect();
    ply.payload.insert("vertex".to_string(), vertices);

    let rgb = colour.map(|c| c.to_rgb8());
    let faces: Vec<ply::DefaultElement> = mesh
        .faces()
        .iter()
        .map(|face| {
            let mut element = ply::DefaultElement::new();
            element.insert(
                "vertex_indices".to_string(),
                ply::Property::ListInt(face.iter().map(|&i| i as i32).collect()),
            );
            if let Some([r, g, b]) = rgb {
                element.insert("red".to_string(), ply::Property::UChar(r));
                element.insert("green".to_string(), ply::Property::UChar(g));
                element.insert("blue".to_string(), ply::Property::UChar(b));
            }
            element
        })
        .collect();
    ply.payload.insert("face".to_string(), faces);

    ply
}

pub fn write_ply<W: Write, T: FloatField>(
    writer: &mut W,
    mesh: &PolygonMesh<T>,
    ascii: bool,
    colour: Option<&Colour>,
) -> std::io::Result<()> {
    let mut ply = mesh_to_ply(mesh, ascii, colour);
    // Fills in the element counts of the header
    ply.make_consistent().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("inconsistent ply document: {:?}", e),
        )
    })?;
    writer::Writer::new().write_ply(writer, &mut ply)?;
    writer.flush()
}

pub fn write_ply_file<P: AsRef<std::path::Path>, T: FloatField>(
    path: &P,
    mesh: &PolygonMesh<T>,
    ascii: bool,
    colour: Option<&Colour>,
) -> std::io::Result<()> {
    let output_file = std::fs::File::create(path)?;
    let mut output_writer = BufWriter::new(output_file);
    write_ply(&mut output_writer, mesh, ascii, colour)
}

/// Read a PolygonMesh in from a ply file
pub fn read_ply<R: std::io::BufRead, T: FloatField>(
    input_reader: &mut R,
) -> std::io::Result<PolygonMesh<T>> {
    let vertex_parser = parser::Parser::<VertexWrapper<T>>::new();
    let face_parser = parser::Parser::<FaceWrapper>::new();
    let header = vertex_parser.read_header(input_reader)?;
    let mut vertex_list = Vec::new();
    let mut face_list = Vec::new();
    for (_ignore_key, element) in &header.elements {
        // we could also just parse them in sequence, but the file format might change
        match element.name.as_ref() {
            "vertex" => {
                vertex_list =
                    vertex_parser.read_payload_for_element(input_reader, element, &header)?;
            }
            "face" => {
                face_list = face_parser.read_payload_for_element(input_reader, element, &header)?;
            }
            other => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("unexpected ply element: {}", other),
                ))
            }
        }
    }

    let mut result = PolygonMesh::with_capacity(vertex_list.len(), face_list.len());
    for VertexWrapper(position) in vertex_list {
        result.add_node(position);
    }
    for FaceWrapper(indices) in face_list {
        if let Some(&bad) = indices.iter().find(|&&n| n >= result.node_len()) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("face references missing vertex {}", bad),
            ));
        }
        result.add_face(indices);
    }
    Ok(result)
}

pub fn read_ply_file<P: AsRef<std::path::Path>, T: FloatField>(
    path: &P,
) -> std::io::Result<PolygonMesh<T>> {
    let input_file = std::fs::File::open(path)?;
    let mut input_reader = BufReader::new(input_file);
    read_ply(&mut input_reader)
}
