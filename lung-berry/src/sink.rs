//! 结果的持久化存储.
//!
//! 核心流程从不直接读写文件, 所有输出都经由这里的 sink 完成.

use crate::error::SinkError;
use crate::pipeline::SliceResult;
use crate::{Affine, ImgWriteVis, Mask, Spacing};
use nifti::writer::WriterOptions;
use nifti::NiftiHeader;
use std::fs;
use std::path::{Path, PathBuf};

/// 掩膜种类.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MaskKind {
    /// 肺掩膜.
    Lung,
    /// 去噪后的血管掩膜.
    Vessel,
}

/// 掩膜接收者. 批处理时会被多个线程同时调用.
pub trait MaskSink: Sync {
    /// 保存 `slice_id` 切片的 `kind` 掩膜. `spacing` 与 `affine` 来自原切片.
    fn write_mask(
        &self,
        slice_id: &str,
        kind: MaskKind,
        mask: &Mask,
        spacing: Spacing,
        affine: &Affine,
    ) -> Result<(), SinkError>;
}

/// 统计表接收者. 在批处理结束后, 以排好序的全部结果调用一次.
pub trait TableSink {
    /// 保存全部结果.
    fn write_table(&self, results: &[SliceResult]) -> Result<(), SinkError>;
}

fn create_dir(dir: &Path) -> Result<(), SinkError> {
    fs::create_dir_all(dir).map_err(|source| SinkError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// 以 nifti 格式保存掩膜, 前景为 255.
///
/// 肺掩膜保存为 `<root>/lungImages/<id>_mask.nii.gz`,
/// 血管掩膜保存为 `<root>/Vessels/<id>_vessel_only_mask.nii.gz`.
#[derive(Clone, Debug)]
pub struct NiftiMaskSink {
    root: PathBuf,
}

impl NiftiMaskSink {
    /// 肺掩膜子目录.
    pub const LUNG_DIR: &'static str = "lungImages";

    /// 血管掩膜子目录.
    pub const VESSEL_DIR: &'static str = "Vessels";

    /// 在 `root` 下保存. 子目录会被立即创建.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, SinkError> {
        let root = root.as_ref().to_path_buf();
        create_dir(&root.join(Self::LUNG_DIR))?;
        create_dir(&root.join(Self::VESSEL_DIR))?;
        Ok(Self { root })
    }

    /// 掩膜的保存路径.
    pub fn path_of(&self, slice_id: &str, kind: MaskKind) -> PathBuf {
        match kind {
            MaskKind::Lung => self
                .root
                .join(Self::LUNG_DIR)
                .join(format!("{slice_id}_mask.nii.gz")),
            MaskKind::Vessel => self
                .root
                .join(Self::VESSEL_DIR)
                .join(format!("{slice_id}_vessel_only_mask.nii.gz")),
        }
    }
}

impl MaskSink for NiftiMaskSink {
    fn write_mask(
        &self,
        slice_id: &str,
        kind: MaskKind,
        mask: &Mask,
        spacing: Spacing,
        affine: &Affine,
    ) -> Result<(), SinkError> {
        let mut header = NiftiHeader::default();
        affine.write_into(&mut header);
        // qform 会按仿射变换的列长度改写 pixdim, 这里恢复原切片的分辨率.
        header.pixdim[1] = spacing.sx as f32;
        header.pixdim[2] = spacing.sy as f32;
        header.pixdim[3] = 1.0;

        // [H, W] -> [W, H], 与读取时的轴顺序对应.
        let data = mask.to_sink_values().reversed_axes();
        WriterOptions::new(self.path_of(slice_id, kind))
            .reference_header(&header)
            .write_nifti(&data)?;
        Ok(())
    }
}

/// 以 PNG 格式保存掩膜预览图, 前景为白色. 便于肉眼检查, 不用于后续计算.
///
/// 保存为 `<root>/<id>_lung.png` 与 `<root>/<id>_vessel.png`.
#[derive(Clone, Debug)]
pub struct PngPreviewSink {
    root: PathBuf,
}

impl PngPreviewSink {
    /// 在 `root` 下保存. 目录会被立即创建.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, SinkError> {
        let root = root.as_ref().to_path_buf();
        create_dir(&root)?;
        Ok(Self { root })
    }

    /// 预览图的保存路径.
    pub fn path_of(&self, slice_id: &str, kind: MaskKind) -> PathBuf {
        let suffix = match kind {
            MaskKind::Lung => "lung",
            MaskKind::Vessel => "vessel",
        };
        self.root.join(format!("{slice_id}_{suffix}.png"))
    }
}

impl MaskSink for PngPreviewSink {
    fn write_mask(
        &self,
        slice_id: &str,
        kind: MaskKind,
        mask: &Mask,
        _: Spacing,
        _: &Affine,
    ) -> Result<(), SinkError> {
        mask.save(self.path_of(slice_id, kind))?;
        Ok(())
    }
}

/// 把同一张掩膜依次交给多个 sink. 遇到第一个错误即返回.
#[derive(Default)]
pub struct MaskSinks<'a>(pub Vec<&'a dyn MaskSink>);

impl<'a> MaskSinks<'a> {
    /// 追加一个 sink.
    pub fn push(&mut self, sink: &'a dyn MaskSink) {
        self.0.push(sink);
    }

    /// 是否没有任何 sink.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl MaskSink for MaskSinks<'_> {
    fn write_mask(
        &self,
        slice_id: &str,
        kind: MaskKind,
        mask: &Mask,
        spacing: Spacing,
        affine: &Affine,
    ) -> Result<(), SinkError> {
        self.0
            .iter()
            .try_for_each(|s| s.write_mask(slice_id, kind, mask, spacing, affine))
    }
}

/// 以 CSV 格式保存统计表.
///
/// * `lung_volumes.csv`: `slice_id, lung_area, status`
/// * `vessel_volumes.csv`: `slice_id, lung_area, vessel_area, vessel_ratio_percent, status`
///
/// 不可用的面积留空.
#[derive(Clone, Debug)]
pub struct CsvTableSink {
    root: PathBuf,
}

fn field(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

impl CsvTableSink {
    /// 肺统计表文件名.
    pub const LUNG_TABLE: &'static str = "lung_volumes.csv";

    /// 血管统计表文件名.
    pub const VESSEL_TABLE: &'static str = "vessel_volumes.csv";

    /// 在 `root` 下保存.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, SinkError> {
        let root = root.as_ref().to_path_buf();
        create_dir(&root)?;
        Ok(Self { root })
    }

    /// 肺统计表路径.
    pub fn lung_table(&self) -> PathBuf {
        self.root.join(Self::LUNG_TABLE)
    }

    /// 血管统计表路径.
    pub fn vessel_table(&self) -> PathBuf {
        self.root.join(Self::VESSEL_TABLE)
    }
}

impl TableSink for CsvTableSink {
    fn write_table(&self, results: &[SliceResult]) -> Result<(), SinkError> {
        let mut lung = csv::Writer::from_path(self.lung_table())?;
        lung.write_record(["slice_id", "lung_area", "status"])?;
        for r in results {
            lung.write_record([
                r.slice_id.clone(),
                field(r.lung_area),
                r.status_label().to_string(),
            ])?;
        }
        lung.flush().map_err(|source| SinkError::Io {
            path: self.lung_table(),
            source,
        })?;

        let mut vessel = csv::Writer::from_path(self.vessel_table())?;
        vessel.write_record([
            "slice_id",
            "lung_area",
            "vessel_area",
            "vessel_ratio_percent",
            "status",
        ])?;
        for r in results {
            vessel.write_record([
                r.slice_id.clone(),
                field(r.lung_area),
                field(r.vessel_area),
                field(r.vessel_ratio),
                r.status_label().to_string(),
            ])?;
        }
        vessel.flush().map_err(|source| SinkError::Io {
            path: self.vessel_table(),
            source,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SegmentationFailure, SliceError};
    use crate::CtSlice;
    use ndarray::arr2;
    use std::time::Duration;

    #[test]
    fn test_nifti_mask_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sink = NiftiMaskSink::new(dir.path()).unwrap();
        let mask = Mask::from_raw(arr2(&[[0, 1, 1], [0, 0, 1]]));
        let spacing = Spacing::new(0.75, 0.5);
        let affine = Affine::from_spacing(spacing);
        sink.write_mask("slice007", MaskKind::Vessel, &mask, spacing, &affine)
            .unwrap();

        let path = dir
            .path()
            .join("Vessels")
            .join("slice007_vessel_only_mask.nii.gz");
        assert_eq!(path, sink.path_of("slice007", MaskKind::Vessel));
        let back = CtSlice::open(&path).unwrap();
        assert_eq!(back.shape(), (2, 3));
        assert_eq!(back[(0, 0)], 0.0);
        assert_eq!(back[(0, 2)], 255.0);
        assert_eq!(back[(1, 2)], 255.0);
        assert_eq!(back.spacing(), spacing);
        assert_eq!(back.affine(), &affine);
    }

    #[test]
    fn test_nifti_mask_sink_keeps_oriented_affine() {
        let dir = tempfile::tempdir().unwrap();
        let sink = NiftiMaskSink::new(dir.path()).unwrap();
        let mask = Mask::from_raw(arr2(&[[1, 0], [0, 1]]));
        let spacing = Spacing::new(0.7, 0.7);
        let affine = Affine([
            [-0.7, 0.0, 0.0, 120.5],
            [0.0, -0.7, 0.0, -87.0],
            [0.0, 0.0, 1.0, -300.0],
        ]);
        sink.write_mask("slice001", MaskKind::Lung, &mask, spacing, &affine)
            .unwrap();

        let back = CtSlice::open(sink.path_of("slice001", MaskKind::Lung)).unwrap();
        assert_eq!(back.spacing(), Spacing::new(0.7f32 as f64, 0.7f32 as f64));
        for (ra, rb) in back.affine().0.iter().zip(&affine.0) {
            for (x, y) in ra.iter().zip(rb) {
                assert!((x - y).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_nifti_mask_sink_singular_affine() {
        let dir = tempfile::tempdir().unwrap();
        let sink = NiftiMaskSink::new(dir.path()).unwrap();
        let mask = Mask::from_raw(arr2(&[[1, 1]]));
        let affine = Affine([[0.0; 4]; 3]);
        sink.write_mask("slice002", MaskKind::Lung, &mask, Spacing::unit(), &affine)
            .unwrap();
        let back = CtSlice::open(sink.path_of("slice002", MaskKind::Lung)).unwrap();
        assert_eq!(back.affine(), &affine);
    }

    #[test]
    fn test_png_preview_fan_out() {
        let dir = tempfile::tempdir().unwrap();
        let nifti = NiftiMaskSink::new(dir.path().join("out")).unwrap();
        let png = PngPreviewSink::new(dir.path().join("preview")).unwrap();
        let mut sinks = MaskSinks::default();
        assert!(sinks.is_empty());
        sinks.push(&nifti);
        sinks.push(&png);

        let mask = Mask::from_raw(arr2(&[[1, 0], [0, 1], [1, 1]]));
        let spacing = Spacing::unit();
        let affine = Affine::from_spacing(spacing);
        sinks
            .write_mask("s1", MaskKind::Lung, &mask, spacing, &affine)
            .unwrap();

        assert!(nifti.path_of("s1", MaskKind::Lung).is_file());
        let img = image::open(png.path_of("s1", MaskKind::Lung))
            .unwrap()
            .into_luma8();
        assert_eq!(img.dimensions(), (2, 3));
        assert_eq!(img.get_pixel(0, 0).0, [255]);
        assert_eq!(img.get_pixel(1, 0).0, [0]);
    }

    #[test]
    fn test_csv_table_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvTableSink::new(dir.path()).unwrap();
        let results = vec![
            SliceResult::processed("slice001".into(), 200.0, 5.0, Duration::ZERO),
            SliceResult::failed(
                "slice002".into(),
                SliceError::Segmentation(SegmentationFailure::InsufficientContours { found: 1 }),
                Duration::ZERO,
            ),
        ];
        sink.write_table(&results).unwrap();

        let lung = fs::read_to_string(sink.lung_table()).unwrap();
        assert_eq!(
            lung,
            "slice_id,lung_area,status\nslice001,200,processed\nslice002,,unsegmented\n"
        );
        let vessel = fs::read_to_string(sink.vessel_table()).unwrap();
        assert_eq!(
            vessel,
            "slice_id,lung_area,vessel_area,vessel_ratio_percent,status\n\
             slice001,200,5,2.5,processed\n\
             slice002,,,,unsegmented\n"
        );
    }
}
