#![deny(clippy::unwrap_used)]

use anyhow::Context;
use clap::Parser;
use log::{debug, info, LevelFilter};
use polygon_serialiser::input::load_mesh;
use polygon_serialiser::{
    export_mesh, Colour, ExportError, FileType, MeshFormat, PolygonSerialiserStep, WriterOptions,
};
use simple_logger::SimpleLogger;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[clap(group(
    clap::ArgGroup::new("destination")
        .required(true)
        .multiple(true)
        .args(&["output", "step_config"]),
))]
struct Args {
    #[arg(
        required = true,
        help = "The mesh to export.\nEither a json document {\"points\": [[x, y, z], ...], \"faces\": [[i, ...], ...]} or a stl, ply, vtk or vtp file."
    )]
    input: PathBuf,
    #[arg(short = 'o', help = "Sets the output path, the format suffix is added if missing")]
    output: Option<PathBuf>,
    #[arg(short = 'f', help = "Sets the output format: stl, wrl, obj, ply or vtp (defaults to stl)")]
    format: Option<String>,
    #[arg(long = "binary", help = "Write binary stl, ply and vtp files")]
    binary: bool,
    #[arg(
        long = "colour",
        num_args = 3,
        value_names = ["R", "G", "B"],
        help = "Surface colour in [0, 1] for obj, wrl and ply output"
    )]
    colour: Option<Vec<f32>>,
    #[arg(
        short = 'c',
        help = "Take format and location from a saved step configuration.\nRelative locations resolve against the configuration's directory."
    )]
    step_config: Option<PathBuf>,
    #[arg(short = 'v', action = clap::ArgAction::Count, help = "Sets the level of verbosity")]
    verbose: u8,
}

/// Format hint and output path after merging the step configuration with
/// the command line.
fn destination(args: &Args) -> anyhow::Result<(String, PathBuf)> {
    let mut format = None;
    let mut output = None;

    if let Some(config_path) = &args.step_config {
        let document = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config_dir = config_path.parent().unwrap_or_else(|| Path::new(""));
        let mut step = PolygonSerialiserStep::new(config_dir);
        step.deserialize(&document)
            .with_context(|| format!("Failed to load {}", config_path.display()))?;
        debug!("Step configuration: {:?}", step.config());

        format = Some(step.config().file_format.clone());
        if !step.config().file_loc.is_empty() {
            output = Some(step.output_path());
        }
    }

    let format = args
        .format
        .clone()
        .or(format)
        .unwrap_or_else(|| MeshFormat::Stl.suffix().to_string());
    let output = args
        .output
        .clone()
        .or(output)
        .context("No output location given")?;
    Ok((format, output))
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mesh = load_mesh(&args.input)?;
    let (format, output) = destination(args)?;

    let options = WriterOptions {
        filename: None,
        colour: match args.colour.as_deref() {
            Some(&[r, g, b]) => Some(Colour::new(r, g, b)),
            _ => None,
        },
        file_type: if args.binary {
            FileType::Binary
        } else {
            FileType::Ascii
        },
    };

    let written = export_mesh(&mesh, &format, &output, &options)?;
    info!("Done");
    println!(
        "Wrote {} vertices and {} faces to {}",
        mesh.node_len(),
        mesh.face_len(),
        written.display()
    );
    Ok(())
}

/// `kind: message` for export errors, the full context chain otherwise.
fn error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ExportError>() {
        Some(export_error) => format!("{}: {}", export_error.kind(), export_error),
        None => format!("Error: {:#}", err),
    }
}

/// Run and report, returns the process exit code.
fn execute(args: &Args) -> i32 {
    match run(args) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{}", error_message(&err));
            1
        }
    }
}

fn main() {
    let args: Args = Args::parse();

    // Vary the output based on how many times the user used the "verbose" flag
    if let Err(err) = SimpleLogger::new()
        .with_level(match args.verbose {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init()
    {
        eprintln!("Failed to set up logging: {}", err);
    }

    std::process::exit(execute(&args));
}
