//! 程序运行函数.

use crate::Args;
use log::{info, warn};
use lung_berry::dataset::{MemorySource, SliceDir};
use lung_berry::error::{ConfigError, LoadError, SinkError};
use lung_berry::pipeline::{Batch, BatchReport, SegmentConfig, SliceProcessor, SliceSource};
use lung_berry::sink::{CsvTableSink, MaskSinks, NiftiMaskSink, PngPreviewSink, TableSink};
use lung_berry::{CtWindow, SlicePhantom, Spacing};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use utils::loader;

/// 运行失败. 单张切片的失败不在此列.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("cannot read config {path:?}: {source}")]
    ConfigFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    ConfigJson(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no input directory given, and neither $LUNG_CT_DIR nor $HOME is available")]
    NoInput,

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("cannot build thread pool: {0}")]
    ThreadPool(#[from] ThreadPoolBuildError),
}

/// 解析 `sx,sy` 形式的像素分辨率.
pub fn parse_spacing(s: &str) -> Result<(f64, f64), String> {
    let Some((sx, sy)) = s.split_once(',') else {
        return Err("spacing must be in the format sx,sy".to_string());
    };
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid spacing `{v}`: {e}"))
    };
    Ok((parse(sx)?, parse(sy)?))
}

/// 读取配置文件, 再用命令行参数覆盖.
fn config_of(args: &Args) -> Result<SegmentConfig, RunError> {
    let mut cfg = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| RunError::ConfigFile {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&text)?
        }
        None => SegmentConfig::default(),
    };

    if let Some(v) = args.min_hull_area {
        cfg = cfg.with_min_hull_area(v);
    }
    if let Some(v) = args.closure_tolerance {
        cfg = cfg.with_closure_tolerance(v);
    }
    if let Some(v) = args.vessel_floor {
        cfg = cfg.with_vessel_hu_floor(v);
    }
    if let Some(v) = args.denoise_tolerance {
        cfg = cfg.with_denoise_tolerance(v);
    }
    if args.no_denoise {
        cfg = cfg.with_denoise(false);
    }
    if let Some(ms) = args.budget_ms {
        cfg = cfg.with_slice_budget(Some(Duration::from_millis(ms)));
    }
    cfg.validate()?;
    Ok(cfg)
}

/// 合成胸部切片: 身体轮廓内左右两肺, 肺内有若干血管截面.
fn phantom_source(n: usize) -> MemorySource {
    (0..n)
        .map(|i| {
            let r = 40.0 + (i % 8) as f64;
            let slice = SlicePhantom::new((300, 300), -1000.0)
                .spacing(Spacing::new(0.7, 0.7))
                .disc((150.0, 150.0), 140.0, 40.0)
                .disc((150.0, 90.0), r, -850.0)
                .disc((150.0, 210.0), r, -850.0)
                .disc((140.0, 85.0), 3.0, -50.0)
                .disc((165.0, 215.0), 2.0 + (i % 3) as f64, -50.0)
                .build();
            (format!("phantom{i:04}"), slice)
        })
        .collect()
}

/// 切片预览用的 CT 窗: 肺窗, 以及宽窗, 中等窗和纵隔窗.
fn preview_windows() -> [(&'static str, CtWindow); 4] {
    [
        ("lung", utils::lung_window()),
        ("wide", CtWindow::from_wide_visual()),
        ("medium", CtWindow::from_medium_visual()),
        ("mediastinum", CtWindow::from_mediastinum_visual()),
    ]
}

/// 把每张成功分割的切片以各个预览窗保存为 `<dir>/<id>_ct_<窗>.png`. 返回失败次数.
fn save_slice_previews<S: SliceSource>(src: &S, report: &BatchReport, dir: &Path) -> usize {
    let processed: HashSet<&str> = report
        .results
        .iter()
        .filter(|r| r.is_processed())
        .map(|r| r.slice_id.as_str())
        .collect();

    let mut failed = 0;
    for i in 0..src.len() {
        let id = src.slice_id(i);
        if !processed.contains(id.as_str()) {
            continue;
        }
        let slice = match src.load(i) {
            Ok(s) => s,
            Err(e) => {
                warn!("[{id}] cannot reload slice for preview: {e}");
                failed += 1;
                continue;
            }
        };
        for (name, window) in preview_windows() {
            let path = dir.join(format!("{id}_ct_{name}.png"));
            if let Err(e) = slice.save_windowed(&path, &window) {
                warn!("[{id}] failed to save preview {path:?}: {e}");
                failed += 1;
            }
        }
    }
    failed
}

/// 批处理全部切片. 给出 `previews` 时另外保存切片预览图, 失败次数计入 `sink_errors`.
fn process<S: SliceSource>(
    src: &S,
    processor: &SliceProcessor,
    masks: &MaskSinks,
    previews: Option<&Path>,
    pool: &ThreadPool,
) -> BatchReport {
    let batch = Batch::new(src, processor);
    let batch = if masks.is_empty() {
        batch
    } else {
        batch.with_mask_sink(masks)
    };
    let mut report = pool.install(|| batch.run());
    if let Some(dir) = previews {
        let failed = save_slice_previews(src, &report, dir);
        report.sink_errors += failed;
    }
    report
}

/// 实际运行. 只打印配置时返回 `None`.
pub fn run(args: &Args) -> Result<Option<BatchReport>, RunError> {
    let cfg = config_of(args)?;
    if args.dump_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(None);
    }
    let processor = SliceProcessor::new(cfg)?;

    let nifti;
    let png;
    let mut masks = MaskSinks::default();
    if !args.no_masks {
        nifti = NiftiMaskSink::new(&args.out)?;
        masks.push(&nifti);
    }
    let preview_dir = args.out.join("previews");
    let previews = if args.preview {
        png = PngPreviewSink::new(&preview_dir)?;
        masks.push(&png);
        Some(preview_dir.as_path())
    } else {
        None
    };

    let threads = args.threads.unwrap_or_else(utils::cpus);
    let pool = ThreadPoolBuilder::new().num_threads(threads).build()?;
    info!("using {threads} threads");

    let report = match args.phantom {
        Some(n) => process(&phantom_source(n), &processor, &masks, previews, &pool),
        None => {
            let dir = match &args.input {
                Some(d) => d.clone(),
                None => loader::image_dir_from_env_or_home()
                    .ok_or(RunError::NoInput)?,
            };
            info!("reading slices from {dir:?}");
            let mut src = loader::slice_dir(&dir, &args.prefix)?;
            if let Some((sx, sy)) = args.npy_spacing {
                src = src.with_npy_spacing(Spacing::new(sx, sy));
            }
            process::<SliceDir>(&src, &processor, &masks, previews, &pool)
        }
    };

    CsvTableSink::new(&args.out)?.write_table(&report.results)?;
    Ok(Some(report))
}
