//! 🫁欢迎光临🩻
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx2dF};

pub use crate::data::window::CtWindow;
pub use crate::{Affine, CtSlice, ImgWriteVis, Mask, SlicePhantom, Spacing};

pub use crate::consts::hu::{AIR, LUNG_MAX, LUNG_MIN, VESSEL_FLOOR};

pub use crate::contour::{find_contours, Contour, ContourSet, ConvexHull};
pub use crate::segment::{LungSelection, LungSelector};

pub use crate::pipeline::{
    Batch, BatchReport, HuBand, SegmentConfig, SliceProcessor, SliceResult, SliceSource,
    SliceStatus,
};

pub use crate::error::{
    ConfigError, GeometryDegenerate, InputError, LoadError, SegmentationFailure, SinkError,
    SliceError,
};

pub use crate::dataset::home_dataset_dir_with;
pub use crate::dataset::{self, MemorySource, SliceDir};

pub use crate::sink::{
    CsvTableSink, MaskKind, MaskSink, MaskSinks, NiftiMaskSink, PngPreviewSink, TableSink,
};
