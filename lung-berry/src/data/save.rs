//! 图像的预览存储.

use super::{CtSlice, CtWindow, Mask};
use image::{GrayImage, ImageResult, Luma};
use ndarray::ArrayView2;
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 图像将以便于肉眼查看的方式保存为 8-bit 灰度图, 而不是 "as is" 的方式.
/// 对于 [`Mask`], 背景为黑色, 前景为白色; 对于 [`CtSlice`],
/// 在保存时会用常见的肺窗规范化.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径. 图片格式由扩展名决定.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

fn gray_image(data: ArrayView2<'_, u8>) -> GrayImage {
    let (height, width) = data.dim();
    let mut buf = GrayImage::new(width as u32, height as u32);
    for ((h, w), &pix) in data.indexed_iter() {
        buf.put_pixel(w as u32, h as u32, Luma([pix]));
    }
    buf
}

/// 背景为黑色, 前景为白色.
impl ImgWriteVis for Mask {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        gray_image(self.to_sink_values().view()).save(path)
    }
}

/// 窗位 -600, 窗宽 1500.
impl ImgWriteVis for CtSlice {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        self.save_windowed(path, &CtWindow::from_lung_visual())
    }
}

impl CtSlice {
    /// 以指定的 CT 窗将切片保存为灰度图.
    pub fn save_windowed<P: AsRef<Path>>(&self, path: P, window: &CtWindow) -> ImageResult<()> {
        gray_image(self.display(window).view()).save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Spacing;
    use ndarray::{arr2, Array2};

    #[test]
    fn test_save_mask_preview() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.png");
        let m = Mask::from_raw(arr2(&[[0, 1, 0], [1, 1, 0]]));
        m.save(&path).unwrap();

        let img = image::open(&path).unwrap().into_luma8();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(1, 0).0, [255]);
        assert_eq!(img.get_pixel(2, 1).0, [0]);
    }

    #[test]
    fn test_save_slice_preview() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slice.png");
        let s = CtSlice::new(Array2::from_elem((4, 6), -2000.0), Spacing::unit());
        s.save(&path).unwrap();

        let img = image::open(&path).unwrap().into_luma8();
        assert_eq!(img.dimensions(), (6, 4));
        assert!(img.pixels().all(|p| p.0 == [0]));
    }
}
