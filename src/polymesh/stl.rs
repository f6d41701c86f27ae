// The reader started out as stl_io and has been hacked up significantly.
// https://github.com/hmeyer/stl_io/blob/master/src/lib.rs
use crate::nalgebra_types::*;
use crate::polymesh::PolygonMesh;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, BufWriter};
use std::io::{Read, Result, Write};
use std::iter::Iterator;

const BINARY_HEADER: &[u8] = b"polygon_serialiser binary STL";

/// Write every face as binary STL, polygons are split into triangle fans.
pub fn write_binary_stl<W, T>(writer: &mut W, mesh: &PolygonMesh<T>) -> Result<()>
where
    W: ::std::io::Write,
    T: FloatField,
{
    let mut writer = BufWriter::new(writer);

    // 80 byte header, must not start with "solid"
    let mut header = [0u8; 80];
    header[..BINARY_HEADER.len()].copy_from_slice(BINARY_HEADER);
    writer.write_all(&header)?;

    let triangle_len: usize = (0..mesh.face_len())
        .map(|f| mesh.triangle_fan(f).count())
        .sum();
    writer.write_u32::<LittleEndian>(triangle_len as u32)?;
    for f in 0..mesh.face_len() {
        let normal = mesh.face_normal(f);
        for triangle in mesh.triangle_fan(f) {
            for c in &normal {
                writer.write_f32::<LittleEndian>((*c).as_f32())?;
            }
            for &n in &triangle {
                for c in mesh.node(n) {
                    writer.write_f32::<LittleEndian>((*c).as_f32())?;
                }
            }
            // Attribute byte count
            writer.write_u16::<LittleEndian>(0)?;
        }
    }
    writer.flush()
}

/// Write every face as ASCII STL, polygons are split into triangle fans.
pub fn write_ascii_stl<W, T>(writer: &mut W, mesh: &PolygonMesh<T>) -> Result<()>
where
    W: ::std::io::Write,
    T: FloatField,
{
    let mut writer = BufWriter::new(writer);

    writeln!(writer, "solid ascii")?;
    for f in 0..mesh.face_len() {
        let normal = mesh.face_normal(f);
        for triangle in mesh.triangle_fan(f) {
            writeln!(
                writer,
                " facet normal {:e} {:e} {:e}",
                normal.x.as_f32(),
                normal.y.as_f32(),
                normal.z.as_f32()
            )?;
            writeln!(writer, "  outer loop")?;
            for &n in &triangle {
                let p = mesh.node(n);
                writeln!(
                    writer,
                    "   vertex {:e} {:e} {:e}",
                    p.x.as_f32(),
                    p.y.as_f32(),
                    p.z.as_f32()
                )?;
            }
            writeln!(writer, "  endloop")?;
            writeln!(writer, " endfacet")?;
        }
    }
    writeln!(writer, "endsolid")?;
    writer.flush()
}

/// Read an ASCII or binary STL.
/// Vertices at identical positions are merged, so a mesh written by this
/// crate reads back with its original vertex count.
pub fn read_stl<R, T>(read: &mut R) -> Result<PolygonMesh<T>>
where
    R: ::std::io::Read + ::std::io::Seek,
    T: FloatField,
{
    // Some binary writers start their header with "solid " too
    if is_ascii_stl(read).is_ok() && !has_binary_stl_len(read)? {
        read_ascii_stl(read)
    } else {
        read_binary_stl(read)
    }
}

/// Whether the stream is exactly as long as the binary triangle count says.
fn has_binary_stl_len<R: ::std::io::Read + ::std::io::Seek>(read: &mut R) -> Result<bool> {
    let stream_len = read.seek(::std::io::SeekFrom::End(0))?;
    let result = if stream_len < 84 {
        false
    } else {
        read.seek(::std::io::SeekFrom::Start(80))?;
        let num_triangles = read.read_u32::<LittleEndian>()? as u64;
        stream_len == 84 + 50 * num_triangles
    };
    read.seek(::std::io::SeekFrom::Start(0))?;
    Ok(result)
}

/// Looks up positions by their exact f32 bit pattern.
struct NodeMerger {
    seen: HashMap<[u32; 3], usize>,
}

impl NodeMerger {
    fn new() -> NodeMerger {
        NodeMerger {
            seen: HashMap::new(),
        }
    }

    fn add<T: FloatField>(&mut self, mesh: &mut PolygonMesh<T>, position: SVector<T, 3>) -> usize {
        let key = [
            position.x.as_f32().to_bits(),
            position.y.as_f32().to_bits(),
            position.z.as_f32().to_bits(),
        ];
        *self
            .seen
            .entry(key)
            .or_insert_with(|| mesh.add_node(position))
    }
}

fn read_binary_stl<R: std::io::Read + std::io::Seek, T: FloatField>(
    read: &mut R,
) -> Result<PolygonMesh<T>> {
    let stream_len = read.seek(::std::io::SeekFrom::End(0))?;
    read.seek(::std::io::SeekFrom::Start(0))?;

    let mut reader = BufReader::new(read);
    reader.read_exact(&mut [0u8; 80])?;
    let num_triangles = reader.read_u32::<LittleEndian>()? as usize;
    if (stream_len as usize) < 84 + 50 * num_triangles {
        return Err(::std::io::Error::new(
            ::std::io::ErrorKind::UnexpectedEof,
            format!("stream too short for {} triangles", num_triangles),
        ));
    }
    let mut result = PolygonMesh::<T>::with_capacity(num_triangles, num_triangles);
    let mut merger = NodeMerger::new();

    for _ in 0..num_triangles {
        let mut _normal: SVector<T, 3> = SVector::zero();
        for f in &mut _normal {
            *f = T::frm_f32(reader.read_f32::<LittleEndian>()?);
        }

        let mut indices = vec![0; 3];
        for i in &mut indices {
            let mut position: SVector<T, 3> = SVector::zero();
            for c in &mut position {
                *c = T::frm_f32(reader.read_f32::<LittleEndian>()?);
            }
            *i = merger.add(&mut result, position);
        }
        reader.read_u16::<LittleEndian>()?;
        result.add_face(indices);
    }

    Ok(result)
}

pub fn is_ascii_stl<R: ::std::io::Read + ::std::io::Seek>(read: &mut R) -> Result<()> {
    let mut header = String::new();
    let maybe_read_error = BufReader::new(&mut *read).read_line(&mut header);
    // Try to seek back to start before evaluating potential read errors.
    read.seek(::std::io::SeekFrom::Start(0))?;
    maybe_read_error?;
    if header.starts_with("solid ") {
        Ok(())
    } else {
        Err(::std::io::Error::new(
            ::std::io::ErrorKind::InvalidData,
            format!("ascii starts with solid, found: {:?}", header),
        ))
    }
}

fn ascii_expect_static<L>(lines: &mut L, expectation: &[&str]) -> Result<()>
where
    L: std::iter::Iterator<Item = Result<Vec<String>>>,
{
    if let Some(line) = lines.next() {
        let line = line?;
        if line != expectation {
            return Err(::std::io::Error::new(
                ::std::io::ErrorKind::InvalidData,
                format!("expected {:?}, got {:?}", expectation, line),
            ));
        }
    } else {
        return Err(::std::io::Error::new(
            ::std::io::ErrorKind::UnexpectedEof,
            format!("EOF while expecting {:?}", expectation),
        ));
    }
    Ok(())
}

fn ascii_tokens_to_vec3<T: FloatField>(tokens: &[String]) -> Result<SVector<T, 3>> {
    let mut result = SVector::zeros();
    for i in 0..3 {
        let value: f64 = tokens[i].parse().map_err(|_| {
            ::std::io::Error::new(
                ::std::io::ErrorKind::InvalidData,
                format!("expected f64, got {:?}", tokens[i]),
            )
        })?;
        if !value.is_finite() {
            return Err(::std::io::Error::new(
                ::std::io::ErrorKind::InvalidData,
                format!("expected finite f64, got {}", value),
            ));
        }
        result[i] = T::frm_f64(value);
    }
    Ok(result)
}

fn read_ascii_stl<R: std::io::Read, T: FloatField>(read: &mut R) -> Result<PolygonMesh<T>> {
    // Only call if is_ascii_stl passes
    let mut lines = BufReader::new(read).lines();
    lines.next();

    let mut tokens = lines.map(|result| {
        result.map(|l| {
            // Make lines into iterator over vectors of tokens
            l.split_whitespace()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
        })
    });

    let mut result: PolygonMesh<T> = PolygonMesh::<T>::new();
    let mut merger = NodeMerger::new();
    loop {
        let face_header = match tokens.next() {
            Some(face_header) => face_header?,
            None => {
                return Err(::std::io::Error::new(
                    ::std::io::ErrorKind::UnexpectedEof,
                    "EOF while expecting facet or endsolid.",
                ))
            }
        };
        if !face_header.is_empty() && face_header[0] == "endsolid" {
            break;
        }
        if face_header.len() != 5 || face_header[0] != "facet" || face_header[1] != "normal" {
            return Err(::std::io::Error::new(
                ::std::io::ErrorKind::InvalidData,
                format!("invalid facet header: {:?}", face_header),
            ));
        }
        let _normal = ascii_tokens_to_vec3::<T>(&face_header[2..5])?;
        ascii_expect_static(&mut tokens, &["outer", "loop"])?;
        let mut triangle_indices = vec![0; 3];
        for vertex_result in &mut triangle_indices {
            if let Some(line) = tokens.next() {
                let line = line?;
                if line.len() != 4 || line[0] != "vertex" {
                    return Err(::std::io::Error::new(
                        ::std::io::ErrorKind::InvalidData,
                        format!("vertex f32 f32 f32, got {:?}", line),
                    ));
                }
                *vertex_result = merger.add(&mut result, ascii_tokens_to_vec3(&line[1..4])?);
            } else {
                return Err(::std::io::Error::new(
                    ::std::io::ErrorKind::UnexpectedEof,
                    "EOF while expecting vertex",
                ));
            }
        }
        result.add_face(triangle_indices);
        ascii_expect_static(&mut tokens, &["endloop"])?;
        ascii_expect_static(&mut tokens, &["endfacet"])?;
    }
    Ok(result)
}

pub fn write_stl_file<P: AsRef<std::path::Path>, T: FloatField>(
    path: &P,
    mesh: &PolygonMesh<T>,
    ascii: bool,
) -> Result<()> {
    let output_file = std::fs::File::create(path)?;
    let mut output_writer = BufWriter::new(output_file);
    if ascii {
        write_ascii_stl(&mut output_writer, mesh)?;
    } else {
        write_binary_stl(&mut output_writer, mesh)?;
    }
    output_writer.flush()
}

pub fn read_stl_file<P: AsRef<std::path::Path>, T: FloatField>(path: &P) -> Result<PolygonMesh<T>> {
    let input_file = std::fs::File::open(path)?;
    let mut input_reader = BufReader::new(input_file);
    read_stl(&mut input_reader)
}
