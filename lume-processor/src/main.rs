use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use lume_mesh::{ImportOptions, MeshStore, pack};

#[derive(Debug, Parser)]
#[command(author, version, about = "Imports OBJ files and packs them for upload")]
struct Cli {
    /// OBJ files to import
    #[arg(num_args = 1.., required = true)]
    inputs: Vec<PathBuf>,
    /// Where to write the packed meshes
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Swap the second and third index of every triangle
    #[arg(long)]
    flip_winding: bool,
    /// Keep source coordinates instead of fitting each mesh into the unit sphere
    #[arg(long)]
    no_normalize: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let options = ImportOptions {
        flip_winding: cli.flip_winding,
        normalize: !cli.no_normalize,
    };

    let start_total = Instant::now();
    let mut store = MeshStore::new();

    for input in &cli.inputs {
        println!("Processing {}...", input.display());
        let start = Instant::now();
        let keys = store
            .try_load(input, &options)
            .with_context(|| format!("Failed to import OBJ file: {}", input.display()))?;

        for key in &keys {
            let mesh = store.get_mesh(*key)?;
            println!(
                "  {} '{}': {} vertices, {} triangles, {}",
                key,
                mesh.name(),
                mesh.vertices().len(),
                mesh.triangle_count(),
                mesh.material()
            );
        }
        println!("Imported {} meshes in {:.2}s", keys.len(), start.elapsed().as_secs_f32());
    }

    if let Some(output) = &cli.output {
        let save_start = Instant::now();
        pack::save_store(&store, output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("Saved to {} in {:.2}s", output.display(), save_start.elapsed().as_secs_f32());
    } else {
        log::info!("No output path given, skipping pack");
    }

    println!(
        "{} meshes, {} materials, total {:.2}s",
        store.len(),
        store.materials().len(),
        start_total.elapsed().as_secs_f32()
    );
    Ok(())
}
