//! Legacy VTK polydata files.
//!
//! The file starts with a fixed text header (version line, title, `ASCII` or
//! `BINARY`, `DATASET POLYDATA`) followed by `POINTS` and `POLYGONS`
//! sections. Binary sections are big endian, as the legacy format requires.

use crate::nalgebra_types::*;
use crate::polymesh::PolygonMesh;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{BufWriter, Read, Result, Write};

const VERSION_LINE: &str = "# vtk DataFile Version 3.0";

pub fn write_vtk<W, T>(writer: &mut W, mesh: &PolygonMesh<T>, ascii: bool) -> Result<()>
where
    W: ::std::io::Write,
    T: FloatField,
{
    let mut writer = BufWriter::new(writer);

    writeln!(writer, "{}", VERSION_LINE)?;
    writeln!(writer, "polygon_serialiser output")?;
    writeln!(writer, "{}", if ascii { "ASCII" } else { "BINARY" })?;
    writeln!(writer, "DATASET POLYDATA")?;

    writeln!(writer, "POINTS {} float", mesh.node_len())?;
    for p in mesh.nodes() {
        if ascii {
            writeln!(writer, "{} {} {}", p.x.as_f32(), p.y.as_f32(), p.z.as_f32())?;
        } else {
            for c in p {
                writer.write_f32::<BigEndian>((*c).as_f32())?;
            }
        }
    }
    if !ascii {
        writeln!(writer)?;
    }

    writeln!(
        writer,
        "POLYGONS {} {}",
        mesh.face_len(),
        mesh.face_len() + mesh.connectivity_len()
    )?;
    for face in mesh.faces() {
        if ascii {
            write!(writer, "{}", face.len())?;
            for n in face {
                write!(writer, " {}", n)?;
            }
            writeln!(writer)?;
        } else {
            writer.write_i32::<BigEndian>(face.len() as i32)?;
            for &n in face {
                writer.write_i32::<BigEndian>(n as i32)?;
            }
        }
    }
    if !ascii {
        writeln!(writer)?;
    }
    writer.flush()
}

fn invalid_data<S: Into<String>>(message: S) -> ::std::io::Error {
    ::std::io::Error::new(::std::io::ErrorKind::InvalidData, message.into())
}

fn unexpected_eof(expecting: &str) -> ::std::io::Error {
    ::std::io::Error::new(
        ::std::io::ErrorKind::UnexpectedEof,
        format!("EOF while expecting {}", expecting),
    )
}

/// Walks a legacy file that mixes text lines and binary blocks.
struct LegacyCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> LegacyCursor<'a> {
    fn line(&mut self) -> Result<&'a str> {
        if self.pos >= self.bytes.len() {
            return Err(unexpected_eof("a line"));
        }
        let rest = &self.bytes[self.pos..];
        let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        self.pos += (end + 1).min(rest.len());
        let line = std::str::from_utf8(&rest[..end]).map_err(|e| invalid_data(e.to_string()))?;
        Ok(line.trim_end_matches('\r'))
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.pos >= self.bytes.len()
    }

    fn token(&mut self, expecting: &str) -> Result<&'a str> {
        self.skip_whitespace();
        let start = self.pos;
        while self.pos < self.bytes.len() && !self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(unexpected_eof(expecting));
        }
        std::str::from_utf8(&self.bytes[start..self.pos]).map_err(|e| invalid_data(e.to_string()))
    }

    fn parse<F: std::str::FromStr>(&mut self, expecting: &str) -> Result<F> {
        let token = self.token(expecting)?;
        token
            .parse()
            .map_err(|_| invalid_data(format!("expected {}, got {:?}", expecting, token)))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.bytes.len() - self.pos < len {
            return Err(unexpected_eof("binary data"));
        }
        let block = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(block)
    }
}

fn read_points<T: FloatField>(
    cursor: &mut LegacyCursor,
    ascii: bool,
    result: &mut PolygonMesh<T>,
) -> Result<()> {
    let count: usize = cursor.parse("point count")?;
    let data_type = cursor.token("point data type")?.to_lowercase();
    let width = match data_type.as_str() {
        "float" => 4,
        "double" => 8,
        other => return Err(invalid_data(format!("unsupported point type {}", other))),
    };

    if ascii {
        for _ in 0..count {
            let mut position: SVector<T, 3> = SVector::zero();
            for c in &mut position {
                *c = T::frm_f64(cursor.parse("point coordinate")?);
            }
            result.add_node(position);
        }
    } else {
        cursor.line()?;
        let mut block = cursor.take(count.saturating_mul(3 * width))?;
        for _ in 0..count {
            let mut position: SVector<T, 3> = SVector::zero();
            for c in &mut position {
                *c = if width == 4 {
                    T::frm_f32(block.read_f32::<BigEndian>()?)
                } else {
                    T::frm_f64(block.read_f64::<BigEndian>()?)
                };
            }
            result.add_node(position);
        }
    }
    Ok(())
}

/// Reads a cell section, each cell is its size followed by its node indices.
fn read_cells(cursor: &mut LegacyCursor, ascii: bool) -> Result<Vec<Vec<usize>>> {
    let count: usize = cursor.parse("cell count")?;
    let size: usize = cursor.parse("cell list size")?;

    let mut values = Vec::new();
    if ascii {
        for _ in 0..size {
            values.push(cursor.parse::<i64>("cell index")?);
        }
    } else {
        cursor.line()?;
        let mut block = cursor.take(size.saturating_mul(4))?;
        for _ in 0..size {
            values.push(block.read_i32::<BigEndian>()? as i64);
        }
    }

    let mut cells = Vec::new();
    let mut values = values.into_iter();
    for _ in 0..count {
        let len = values.next().ok_or_else(|| invalid_data("cell list too short"))?;
        let mut cell = Vec::new();
        for _ in 0..len {
            let n = values.next().ok_or_else(|| invalid_data("cell list too short"))?;
            if n < 0 {
                return Err(invalid_data(format!("negative cell index {}", n)));
            }
            cell.push(n as usize);
        }
        cells.push(cell);
    }
    if values.next().is_some() {
        return Err(invalid_data("cell list longer than its cells"));
    }
    Ok(cells)
}

/// Read the points and polygons of a legacy polydata file.
/// Vertex, line and strip cells are skipped, as are point and cell attributes.
pub fn read_vtk<R: Read, T: FloatField>(read: &mut R) -> Result<PolygonMesh<T>> {
    let mut bytes = Vec::new();
    read.read_to_end(&mut bytes)?;
    let mut cursor = LegacyCursor {
        bytes: &bytes,
        pos: 0,
    };

    let version = cursor.line()?;
    if !version.starts_with("# vtk DataFile") {
        return Err(invalid_data(format!("not a vtk file: {:?}", version)));
    }
    let _title = cursor.line()?;
    let ascii = match cursor.line()?.trim().to_uppercase().as_str() {
        "ASCII" => true,
        "BINARY" => false,
        other => return Err(invalid_data(format!("unknown vtk encoding {:?}", other))),
    };
    let dataset: Vec<&str> = cursor.line()?.split_whitespace().collect();
    if dataset.len() != 2
        || !dataset[0].eq_ignore_ascii_case("DATASET")
        || !dataset[1].eq_ignore_ascii_case("POLYDATA")
    {
        return Err(invalid_data(format!("expected DATASET POLYDATA, got {:?}", dataset)));
    }

    let mut result = PolygonMesh::new();
    let mut polygons = Vec::new();
    while !cursor.at_end() {
        let keyword = cursor.token("section keyword")?.to_uppercase();
        match keyword.as_str() {
            "POINTS" => read_points(&mut cursor, ascii, &mut result)?,
            "POLYGONS" => polygons = read_cells(&mut cursor, ascii)?,
            "VERTICES" | "LINES" | "TRIANGLE_STRIPS" => {
                read_cells(&mut cursor, ascii)?;
            }
            "POINT_DATA" | "CELL_DATA" | "FIELD" => break,
            other => return Err(invalid_data(format!("unexpected vtk section {}", other))),
        }
    }

    for face in polygons {
        if let Some(&bad) = face.iter().find(|&&n| n >= result.node_len()) {
            return Err(invalid_data(format!("polygon references missing point {}", bad)));
        }
        result.add_face(face);
    }
    Ok(result)
}

pub fn write_vtk_file<P: AsRef<std::path::Path>, T: FloatField>(
    path: &P,
    mesh: &PolygonMesh<T>,
    ascii: bool,
) -> Result<()> {
    let output_file = std::fs::File::create(path)?;
    let mut output_writer = BufWriter::new(output_file);
    write_vtk(&mut output_writer, mesh, ascii)?;
    output_writer.flush()
}

pub fn read_vtk_file<P: AsRef<std::path::Path>, T: FloatField>(path: &P) -> Result<PolygonMesh<T>> {
    let mut input_file = std::fs::File::open(path)?;
    read_vtk(&mut input_file)
}
