//! 逐切片的流程编排, 参数, 统计记录与批处理.

mod batch;
mod config;
mod processor;
mod result;

pub use batch::{Batch, BatchReport, SliceSource};
pub use config::{HuBand, SegmentConfig};
pub use processor::{SliceOutcome, SliceProcessor};
pub use result::{vessel_ratio, SliceResult, SliceStatus};
