use crate::error::SliceError;
use std::time::Duration;

/// 单张切片的处理状态.
#[derive(Clone, Debug, PartialEq)]
pub enum SliceStatus {
    /// 成功分割.
    Processed,

    /// 处理失败. 失败只影响该切片.
    Failed(SliceError),
}

/// 单张切片的统计记录.
///
/// 分割失败时, 所有面积均为 `None` (不可用), 而不是 0.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceResult {
    /// 切片 id, 结果按它排序.
    pub slice_id: String,

    /// 肺面积.
    pub lung_area: Option<f64>,

    /// 去噪后的血管面积.
    pub vessel_area: Option<f64>,

    /// 血管/肺面积比, 百分数. 肺面积为 0 时不可用.
    pub vessel_ratio: Option<f64>,

    /// 处理状态.
    pub status: SliceStatus,

    /// 处理耗时 (含加载).
    pub elapsed: Duration,
}

/// `vessel_area / lung_area * 100`.
#[inline]
pub fn vessel_ratio(vessel_area: f64, lung_area: f64) -> Option<f64> {
    (lung_area > 0.0).then(|| vessel_area / lung_area * 100.0)
}

impl SliceResult {
    /// 成功的记录.
    pub fn processed(
        slice_id: String,
        lung_area: f64,
        vessel_area: f64,
        elapsed: Duration,
    ) -> Self {
        Self {
            slice_id,
            lung_area: Some(lung_area),
            vessel_area: Some(vessel_area),
            vessel_ratio: vessel_ratio(vessel_area, lung_area),
            status: SliceStatus::Processed,
            elapsed,
        }
    }

    /// 失败的记录.
    pub fn failed(slice_id: String, error: SliceError, elapsed: Duration) -> Self {
        Self {
            slice_id,
            lung_area: None,
            vessel_area: None,
            vessel_ratio: None,
            status: SliceStatus::Failed(error),
            elapsed,
        }
    }

    /// 是否成功分割.
    #[inline]
    pub fn is_processed(&self) -> bool {
        matches!(self.status, SliceStatus::Processed)
    }

    /// 失败原因.
    #[inline]
    pub fn error(&self) -> Option<&SliceError> {
        match &self.status {
            SliceStatus::Processed => None,
            SliceStatus::Failed(e) => Some(e),
        }
    }

    /// 状态的简短文字描述, 用于表格.
    pub fn status_label(&self) -> &'static str {
        match &self.status {
            SliceStatus::Processed => "processed",
            SliceStatus::Failed(SliceError::Input(_)) => "invalid-input",
            SliceStatus::Failed(SliceError::Segmentation(_)) => "unsegmented",
            SliceStatus::Failed(SliceError::BudgetExceeded { .. }) => "over-budget",
            SliceStatus::Failed(SliceError::Load(_)) => "load-error",
        }
    }
}
