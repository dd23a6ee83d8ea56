use super::iter::PosIter;
use crate::consts::gray::*;
use crate::Idx2d;
use ndarray::{Array2, ArrayView2, Zip};
use std::ops::Index;

/// 二值掩膜. 内部只存在 [`MASK_BACKGROUND`] (0) 和 [`MASK_FOREGROUND`] (1) 两种像素值.
///
/// 数据以 `(H, W)` 组织, 与 [`crate::CtSlice`] 一致.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mask {
    data: Array2<u8>,
}

impl Index<Idx2d> for Mask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl Mask {
    /// 全背景掩膜.
    #[inline]
    pub fn zeros(shape: Idx2d) -> Self {
        Self {
            data: Array2::from_elem(shape, MASK_BACKGROUND),
        }
    }

    /// 由原始数据创建. 任何非零像素都会被规范化为前景.
    pub fn from_raw(mut data: Array2<u8>) -> Self {
        data.mapv_inplace(|p| {
            if is_foreground(p) {
                MASK_FOREGROUND
            } else {
                MASK_BACKGROUND
            }
        });
        Self { data }
    }

    /// 直接包装. 调用者保证 `data` 只含 0 和 1.
    #[inline]
    pub(crate) fn from_binary_unchecked(data: Array2<u8>) -> Self {
        debug_assert!(data.iter().all(|&p| p <= MASK_FOREGROUND));
        Self { data }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn view(&self) -> ArrayView2<'_, u8> {
        self.data.view()
    }

    /// 取出底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<u8> {
        self.data
    }

    /// 掩膜的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&u8> {
        self.data.get(pos)
    }

    /// 给定位置是否为前景. 越界视为背景.
    #[inline]
    pub fn is_set(&self, pos: Idx2d) -> bool {
        self.get(pos).map_or(false, |&p| is_foreground(p))
    }

    /// 前景像素个数.
    pub fn count_foreground(&self) -> usize {
        self.data.iter().filter(|&&p| is_foreground(p)).count()
    }

    /// 是否全为背景.
    pub fn is_background(&self) -> bool {
        self.data.iter().all(|&p| is_background(p))
    }

    /// 以行优先规则, 获取能迭代所有 `(索引, 像素值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &u8)> {
        self.data.indexed_iter()
    }

    /// 以行优先规则迭代所有索引.
    #[inline]
    pub fn pos_iter(&self) -> PosIter {
        PosIter::new(self.shape())
    }

    /// 以行优先规则迭代所有前景像素的索引.
    pub fn foreground_pos(&self) -> impl Iterator<Item = Idx2d> + '_ {
        self.pos_iter().filter(|&pos| is_foreground(self.data[pos]))
    }

    /// `self` 的前景是否完全包含于 `other` 的前景. 形状不同时返回 `false`.
    pub fn is_subset_of(&self, other: &Mask) -> bool {
        if self.shape() != other.shape() {
            return false;
        }
        Zip::from(&self.data)
            .and(&other.data)
            .all(|&a, &b| is_background(a) || is_foreground(b))
    }

    /// 将前景映射为 [`SINK_FOREGROUND`] (255), 用于持久化存储.
    pub fn to_sink_values(&self) -> Array2<u8> {
        self.data.mapv(|p| {
            if is_foreground(p) {
                SINK_FOREGROUND
            } else {
                MASK_BACKGROUND
            }
        })
    }
}
