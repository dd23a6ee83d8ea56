//! HU 区间二值化.

use crate::consts::gray::{MASK_BACKGROUND, MASK_FOREGROUND};
use crate::Mask;
use ndarray::ArrayView2;

/// 以 HU 区间 `[min, max]` 二值化.
///
/// 先把每个像素裁剪到 `[min, max]`, 裁剪后恰好等于 `max` 的像素 (即原值不低于 `max`)
/// 记为 0, 其余记为 1. 在肺窗 `[-1000, -300]` 下, 软组织为 0, 肺与体外空气为 1.
///
/// `min == max` 时所有像素都等于 `max`, 结果为全 0. 这是合法的退化输出.
/// NaN 被裁剪为 `min`, 因此记为 1 (除非区间退化).
pub fn binarize(data: ArrayView2<'_, f32>, min: f32, max: f32) -> Mask {
    let out = data.mapv(|hu| {
        if hu.max(min).min(max) == max {
            MASK_BACKGROUND
        } else {
            MASK_FOREGROUND
        }
    });
    Mask::from_binary_unchecked(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_lung_band() {
        let data = arr2(&[[-2000.0f32, -1000.0, -650.0], [-300.0, 40.0, f32::NAN]]);
        let m = binarize(data.view(), -1000.0, -300.0);
        assert_eq!(m.view(), arr2(&[[1u8, 1, 1], [0, 0, 1]]));
    }

    #[test]
    fn test_degenerate_band() {
        let data = arr2(&[[-2000.0f32, 0.0], [500.0, -300.0]]);
        let m = binarize(data.view(), -300.0, -300.0);
        assert!(m.is_background());
    }

    #[test]
    fn test_binary_input_round_trip() {
        let data = arr2(&[[0.0f32, 1.0, 1.0], [1.0, 0.0, 0.0]]);
        let once = binarize(data.view(), 0.0, 1.0);
        assert_eq!(once.view(), arr2(&[[1u8, 0, 0], [0, 1, 1]]));

        // 以相同的区间再二值化一次, 得到原来的掩膜.
        let again = binarize(once.view().mapv(f32::from).view(), 0.0, 1.0);
        assert_eq!(again.view(), data.mapv(|v| v as u8));

        // 结果只含 0 和 1.
        assert!(once.view().iter().all(|&p| p <= 1));
    }
}
