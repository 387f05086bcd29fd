//! Image to voxel art converter binary.
//!
//! Usage: cargo run --release --bin voxart -- <IMAGE> [OPTIONS]
//!
//! Options:
//!   --resolution <N>      Blocks along the longest edge (default: 64)
//!   --depth <N>           Depth layer count (default: 10)
//!   --palette <NAME>      Palette name (default: "minecraft")
//!   --palette-file <PATH> Load an extra palette from a JSON block list
//!   --fill <MODE>         surface | solid | hollow (default: surface)
//!   --no-dither           Disable Floyd-Steinberg error diffusion
//!   --smooth <N>          Depth box-blur passes (default: 2)
//!   --block-size <S>      OBJ mesh units per voxel (default: 1.0)
//!   --no-merge            Disable OBJ face merging
//!   --out <STEM>          Output file stem (default: "voxel_art")
//!   --list-palettes       Print available palette names and exit
//!
//! Output:
//!   <STEM>.schematic      Gzip-compressed NBT block storage
//!   <STEM>.obj, <STEM>.mtl  Polygon mesh with materials

use std::path::Path;

use voxart::export::{export_obj, export_schematic, ObjConfig};
use voxart::grid::PixelGrid;
use voxart::palette::{Catalog, Palette};
use voxart::pipeline::{convert, ConvertOptions};

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let args: Vec<String> = std::env::args().collect();

    let mut catalog = Catalog::builtin();
    if has_flag(&args, "--list-palettes") {
        for name in catalog.names() {
            println!("{name}");
        }
        return;
    }

    let Some(image_path) = args.get(1).filter(|a| !a.starts_with("--")) else {
        eprintln!("Usage: {} <IMAGE> [OPTIONS]", args[0]);
        std::process::exit(1);
    };

    if let Some(path) = parse_str_arg(&args, "--palette-file") {
        let json = std::fs::read_to_string(&path).expect("Failed to read palette file");
        let name = Path::new(&path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("custom")
            .to_string();
        let palette = Palette::from_json(name.clone(), &json).expect("Invalid palette file");
        log::info!("loaded palette '{}' ({} blocks)", name, palette.blocks().len());
        catalog.insert(palette);
    }

    let options = ConvertOptions {
        resolution: parse_usize_arg(&args, "--resolution").unwrap_or(64),
        depth_layers: parse_u32_arg(&args, "--depth").unwrap_or(10),
        palette: parse_str_arg(&args, "--palette").unwrap_or_else(|| "minecraft".to_string()),
        fill_mode: parse_str_arg(&args, "--fill")
            .unwrap_or_else(|| "surface".to_string())
            .parse()
            .expect("Invalid fill mode"),
        dithering: !has_flag(&args, "--no-dither"),
        smooth_iterations: parse_usize_arg(&args, "--smooth").unwrap_or(2),
    };
    let out_stem = parse_str_arg(&args, "--out").unwrap_or_else(|| "voxel_art".to_string());

    log::info!("loading {}", image_path);
    let decoded = image::open(image_path).expect("Failed to open image").to_rgba8();
    let pixels = PixelGrid::from_rgba_bytes(
        decoded.width() as usize,
        decoded.height() as usize,
        decoded.as_raw(),
    )
    .expect("Image has degenerate dimensions");

    let grid = convert(&pixels, &options, &catalog).expect("Conversion failed");

    let stats = grid.stats();
    log::info!(
        "model: {} voxels, {} ({} block types)",
        stats.total_voxels,
        stats.dimensions,
        stats.unique_blocks
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&stats).expect("Stats serialization failed")
    );

    let schematic = export_schematic(&grid).expect("Schematic export failed");
    let schematic_path = format!("{out_stem}.schematic");
    std::fs::write(&schematic_path, schematic).expect("Failed to write schematic");
    log::info!("wrote {}", schematic_path);

    let obj_config = ObjConfig {
        name: out_stem.clone(),
        block_size: parse_f32_arg(&args, "--block-size").unwrap_or(1.0),
        merge_faces: !has_flag(&args, "--no-merge"),
    };
    let mesh = export_obj(&grid, &obj_config);
    let obj_path = format!("{out_stem}.obj");
    let mtl_path = format!("{out_stem}.mtl");
    std::fs::write(&obj_path, mesh.obj).expect("Failed to write OBJ");
    std::fs::write(&mtl_path, mesh.mtl).expect("Failed to write MTL");
    log::info!("wrote {} and {}", obj_path, mtl_path);
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

fn parse_str_arg(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_usize_arg(args: &[String], name: &str) -> Option<usize> {
    parse_str_arg(args, name).and_then(|v| v.parse().ok())
}

fn parse_u32_arg(args: &[String], name: &str) -> Option<u32> {
    parse_str_arg(args, name).and_then(|v| v.parse().ok())
}

fn parse_f32_arg(args: &[String], name: &str) -> Option<f32> {
    parse_str_arg(args, name).and_then(|v| v.parse().ok())
}
