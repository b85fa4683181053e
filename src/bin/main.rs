//! scene-to-obj CLI
//!
//! Export a JSON scene document to an OBJ/MTL pair.

use clap::Parser;
use scene_to_obj::dedup::DEFAULT_POSITION_TOLERANCE_MM;
use scene_to_obj::{
    load_scene, walk, ExportConfig, MtlTemplate, ObjExporter, Result, MM_PER_FOOT,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scene-to-obj")]
#[command(author, version, about = "Export scene-graph traversals to OBJ/MTL", long_about = None)]
struct Cli {
    /// Input JSON scene document
    #[arg(short, long)]
    input: PathBuf,

    /// Output OBJ file path; the material file is written beside it as model.mtl
    #[arg(short, long)]
    output: PathBuf,

    /// Millimetres per host length unit (default: feet)
    #[arg(long, default_value_t = MM_PER_FOOT)]
    unit_scale: f64,

    /// Position deduplication tolerance in millimetres
    #[arg(long, default_value_t = DEFAULT_POSITION_TOLERANCE_MM)]
    position_tolerance: f64,

    /// Emit specular/shininess material blocks instead of transparency lines
    #[arg(long)]
    specular: bool,
}

fn run(cli: &Cli) -> Result<()> {
    let document = load_scene(&cli.input)?;

    let config = ExportConfig {
        unit_scale: cli.unit_scale,
        position_tolerance_mm: cli.position_tolerance,
        mtl_template: if cli.specular {
            MtlTemplate::Specular
        } else {
            MtlTemplate::Transparency
        },
    };

    let mut exporter = ObjExporter::with_config(&cli.output, config);
    walk(&document, &mut exporter)?;

    println!(
        "Wrote {} ({} vertices, {} triangles, {} materials)",
        cli.output.display(),
        exporter.accumulator().positions().len(),
        exporter.accumulator().triangle_count(),
        exporter.tracker().records().len(),
    );
    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
