//! VRML 2.0 export of a render scene, one `Shape` per actor.

use crate::nalgebra_types::*;
use crate::scene::{Actor, RenderWindow};
use std::io::{BufWriter, Result, Write};

fn write_shape<W: Write, T: FloatField>(writer: &mut W, actor: &Actor<T>) -> Result<()> {
    let property = &actor.property;
    let diffuse = property.colour.scaled(property.diffuse);

    writeln!(writer, "Transform {{")?;
    writeln!(writer, "  translation 0 0 0")?;
    writeln!(writer, "  rotation 0 0 1 0")?;
    writeln!(writer, "  scale 1 1 1")?;
    writeln!(writer, "  children [")?;
    writeln!(writer, "    Shape {{")?;
    writeln!(writer, "      appearance Appearance {{")?;
    writeln!(writer, "        material Material {{")?;
    writeln!(writer, "          ambientIntensity {}", property.ambient)?;
    writeln!(
        writer,
        "          diffuseColor {} {} {}",
        diffuse.r, diffuse.g, diffuse.b
    )?;
    writeln!(
        writer,
        "          specularColor {} {} {}",
        property.specular, property.specular, property.specular
    )?;
    // VRML shininess is the specular power scaled to [0, 1]
    writeln!(
        writer,
        "          shininess {}",
        (property.specular_power / 128.0).clamp(0.0, 1.0)
    )?;
    writeln!(writer, "          transparency {}", 1.0 - property.opacity)?;
    writeln!(writer, "        }}")?;
    writeln!(writer, "      }}")?;

    let mesh = actor.mesh();
    writeln!(writer, "      geometry IndexedFaceSet {{")?;
    writeln!(writer, "        solid FALSE")?;
    writeln!(writer, "        coord Coordinate {{")?;
    writeln!(writer, "          point [")?;
    for p in mesh.nodes() {
        writeln!(
            writer,
            "            {} {} {},",
            p.x.as_f64(),
            p.y.as_f64(),
            p.z.as_f64()
        )?;
    }
    writeln!(writer, "          ]")?;
    writeln!(writer, "        }}")?;
    writeln!(writer, "        coordIndex [")?;
    for face in mesh.faces() {
        write!(writer, "          ")?;
        for n in face {
            write!(writer, "{}, ", n)?;
        }
        writeln!(writer, "-1,")?;
    }
    writeln!(writer, "        ]")?;
    writeln!(writer, "      }}")?;
    writeln!(writer, "    }}")?;
    writeln!(writer, "  ]")?;
    writeln!(writer, "}}")
}

pub fn write_vrml<W: Write, T: FloatField>(writer: &mut W, window: &RenderWindow<T>) -> Result<()> {
    let mut writer = BufWriter::new(writer);

    writeln!(writer, "#VRML V2.0 utf8")?;
    writeln!(writer, "# VRML file written by polygon_serialiser")?;
    writeln!(writer)?;

    if let Some(renderer) = window.renderers().first() {
        let sky = renderer.background;
        writeln!(writer, "Background {{")?;
        writeln!(writer, "  skyColor [{} {} {}, ]", sky.r, sky.g, sky.b)?;
        writeln!(writer, "}}")?;
        writeln!(writer)?;
    }
    writeln!(writer, "NavigationInfo {{")?;
    writeln!(writer, "  type [\"EXAMINE\",\"FLY\"]")?;
    writeln!(writer, "  speed 4")?;
    writeln!(writer, "  headlight TRUE")?;
    writeln!(writer, "}}")?;
    writeln!(writer)?;

    for actor in window.actors() {
        write_shape(&mut writer, actor)?;
    }
    writer.flush()
}

pub fn write_vrml_file<P: AsRef<std::path::Path>, T: FloatField>(
    path: &P,
    window: &RenderWindow<T>,
) -> Result<()> {
    let mut output_file = std::fs::File::create(path)?;
    write_vrml(&mut output_file, window)
}
