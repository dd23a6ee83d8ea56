//! 批量分割一个目录下的全部肺部 CT 切片, 保存掩膜与统计表.

mod result;
mod runner;

use clap::Parser;
use log::{error, LevelFilter};
use simple_logger::SimpleLogger;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    about = "Segment lungs and vessels in 2D chest CT slices",
    long_about = None
)]
pub struct Args {
    #[arg(
        help = "Directory of slices (.nii, .nii.gz or .npy). Defaults to $LUNG_CT_DIR or $HOME/dataset/lung/Images"
    )]
    input: Option<PathBuf>,

    #[arg(
        help = "Output directory",
        long = "out",
        short = 'o',
        default_value = "out"
    )]
    out: PathBuf,

    #[arg(
        help = "Only slices whose file name starts with this prefix are processed",
        long = "prefix",
        default_value = "slice"
    )]
    prefix: String,

    #[arg(
        help = "JSON file with segmentation parameters",
        long = "config",
        short = 'c'
    )]
    config: Option<PathBuf>,

    #[arg(
        help = "Minimum convex hull area of a lung contour",
        long = "min-hull-area"
    )]
    min_hull_area: Option<f64>,

    #[arg(
        help = "Closure tolerance of a lung contour",
        long = "closure-tolerance"
    )]
    closure_tolerance: Option<f64>,

    #[arg(
        help = "Lowest HU value counted as vessel",
        long = "vessel-floor",
        allow_hyphen_values = true
    )]
    vessel_floor: Option<f32>,

    #[arg(
        help = "Distance to the lung contour under which vessel pixels are dropped",
        long = "denoise-tolerance"
    )]
    denoise_tolerance: Option<f64>,

    #[arg(
        help = "Skip vessel denoising",
        long = "no-denoise",
        default_value_t = false
    )]
    no_denoise: bool,

    #[arg(help = "Time budget per slice in milliseconds", long = "budget-ms")]
    budget_ms: Option<u64>,

    #[arg(
        help = "Pixel spacing (sx,sy) for .npy slices",
        long = "npy-spacing",
        value_parser = runner::parse_spacing
    )]
    npy_spacing: Option<(f64, f64)>,

    #[arg(
        help = "Do not save nifti masks",
        long = "no-masks",
        default_value_t = false
    )]
    no_masks: bool,

    #[arg(
        help = "Also save PNG previews of the masks and of the windowed slices",
        long = "preview",
        default_value_t = false
    )]
    preview: bool,

    #[arg(
        help = "Process N synthetic slices instead of reading INPUT",
        long = "phantom"
    )]
    phantom: Option<usize>,

    #[arg(
        help = "Print the effective parameters as JSON and exit",
        long = "dump-config",
        default_value_t = false
    )]
    dump_config: bool,

    #[arg(
        help = "Number of worker threads. Defaults to the number of cores",
        long = "threads",
        short = 'j'
    )]
    threads: Option<usize>,

    #[arg(
        help = "Increase log verbosity",
        short = 'v',
        action = clap::ArgAction::Count
    )]
    verbose: u8,
}

fn level_of(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() {
    let args = Args::parse();

    // `RUST_LOG` 优先于 `-v`.
    if let Err(e) = SimpleLogger::new()
        .with_level(level_of(args.verbose))
        .env()
        .init()
    {
        eprintln!("[ERROR] could not set up logger: {e}");
    }

    match runner::run(&args) {
        Ok(Some(report)) => result::Summary::new(&report).analyze(),
        Ok(None) => {}
        Err(e) => {
            error!("{e}");
            std::process::exit(-1);
        }
    }
}
