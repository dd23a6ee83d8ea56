//! 逐切片分割的各个阶段.
//!
//! 每个阶段都是纯函数: 只读取输入, 返回新的结果, 不持有任何跨切片状态.
//! 阶段之间的编排见 [`crate::pipeline`].

pub mod area;
pub mod binarize;
pub mod kdtree;
pub mod raster;
pub mod select;
pub mod vessel;

pub use area::physical_area;
pub use binarize::binarize;
pub use kdtree::KdTree;
pub use raster::rasterize;
pub use select::{ContourVerdict, LungSelection, LungSelector};
pub use vessel::{denoise_vessels, extract_vessels};
