use std::ops::Index;
use std::path::Path;

use nalgebra::{Matrix3, Matrix4};
use ndarray::{Array2, ArrayD, ArrayView2, Axis, Ix2};
use ndarray_npy::ReadNpyError;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions, XForm};

use crate::error::{InputError, LoadError};
use crate::Idx2d;

mod iter;
mod mask;
mod phantom;
mod save;
pub mod window;

pub use mask::Mask;
pub use phantom::SlicePhantom;
pub use save::ImgWriteVis;
pub use window::CtWindow;

/// 单个像素的物理尺寸, 一般以毫米为单位.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spacing {
    /// width 方向 (自然 2D 图像的水平方向) 像素分辨率.
    pub sx: f64,

    /// height 方向 (自然 2D 图像的垂直方向) 像素分辨率.
    pub sy: f64,
}

impl Spacing {
    /// 直接创建. 不检查合法性, 合法性由 [`Spacing::check`] 负责.
    #[inline]
    pub const fn new(sx: f64, sy: f64) -> Self {
        Self { sx, sy }
    }

    /// 各向同性, 且单个像素为单位面积的分辨率.
    #[inline]
    pub const fn unit() -> Self {
        Self { sx: 1.0, sy: 1.0 }
    }

    /// 单个像素的物理面积.
    #[inline]
    pub fn pixel_area(&self) -> f64 {
        self.sx * self.sy
    }

    /// 两个分辨率都必须是有限的正数.
    pub fn check(&self) -> Result<(), InputError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.sx) && ok(self.sy) {
            Ok(())
        } else {
            Err(InputError::InvalidSpacing {
                sx: self.sx,
                sy: self.sy,
            })
        }
    }
}

/// 体素坐标到物理坐标的仿射变换, 即 4x4 齐次矩阵的前三行.
///
/// 核心流程不使用该变换, 只是原样传递给掩膜的持久化.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Affine(pub [[f64; 4]; 3]);

impl Affine {
    /// 以像素分辨率为对角元素, 不含平移和旋转的仿射变换.
    pub fn from_spacing(spacing: Spacing) -> Self {
        Self([
            [spacing.sx, 0.0, 0.0, 0.0],
            [0.0, spacing.sy, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ])
    }

    /// 取 4x4 齐次矩阵的前三行.
    pub fn from_matrix(m: &Matrix4<f64>) -> Self {
        Self(std::array::from_fn(|r| std::array::from_fn(|c| m[(r, c)])))
    }

    /// 4x4 齐次矩阵, 最后一行为 `[0, 0, 0, 1]`.
    pub fn to_matrix(&self) -> Matrix4<f64> {
        Matrix4::from_fn(|r, c| match (r, c) {
            (0..=2, _) => self.0[r][c],
            (_, 3) => 1.0,
            _ => 0.0,
        })
    }

    /// 从 nifti header 读取仿射变换. 优先使用 sform, 其次 qform,
    /// 两者都不可用时退化为 [`Affine::from_spacing`].
    ///
    /// qfac (`pixdim[0]`) 为 0 时按 1 处理.
    fn from_header(header: &NiftiHeader, spacing: Spacing) -> Self {
        if header.sform_code != 0 {
            return Self::from_matrix(&header.sform_affine::<f64>());
        }
        if header.qform_code == 0 || !header.pixdim[1..=3].iter().all(|&d| d >= 0.0) {
            return Self::from_spacing(spacing);
        }

        let mut header = header.clone();
        if header.pixdim[0] == 0.0 {
            header.pixdim[0] = 1.0;
        }
        let qfac_valid = (header.pixdim[0].abs() - 1.0).abs() < 1e-6;
        if !qfac_valid {
            return Self::from_spacing(spacing);
        }
        header.pixdim[0] = header.pixdim[0].signum();
        Self::from_matrix(&header.qform_affine::<f64>())
    }

    /// 将仿射变换写入 `header`. sform 原样保存, qform 标记为未知.
    ///
    /// 线性部分奇异时无法构造 qform, 只写 sform.
    pub(crate) fn write_into(&self, header: &mut NiftiHeader) {
        let m = self.to_matrix();
        let linear = Matrix3::from_fn(|r, c| self.0[r][c]);
        if m.iter().all(|v| v.is_finite()) && linear.determinant() != 0.0 {
            header.set_affine(&m);
        } else {
            header.set_sform(&m, XForm::AlignedAnat);
            header.qform_code = XForm::Unknown as i16;
        }
    }
}

/// 2D CT 水平切片, 包括 HU 值, 像素分辨率和仿射变换. HU 值以 `f32` 保存.
///
/// 切片加载后不可修改. 数据以 `(H, W)` 组织: 第一维向下增长, 第二维向右增长.
#[derive(Clone, Debug)]
pub struct CtSlice {
    data: Array2<f32>,
    spacing: Spacing,
    affine: Affine,
}

impl Index<Idx2d> for CtSlice {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

/// 去掉前导的单元素维度, 直到只剩两维. 失败时返回原形状.
fn planar(data: ArrayD<f32>) -> Result<Array2<f32>, InputError> {
    let shape = data.shape().to_vec();
    let mut data = data;
    while data.ndim() > 2 && data.len_of(Axis(0)) == 1 {
        data = data.index_axis_move(Axis(0), 0);
    }
    let data = data
        .into_dimensionality::<Ix2>()
        .map_err(|_| InputError::NotPlanar { shape })?;
    Ok(data.as_standard_layout().into_owned())
}

impl CtSlice {
    /// 直接创建切片, 仿射变换由分辨率构造.
    ///
    /// 该方法不检查数据合法性 (空切片, 非法分辨率), 由 [`CtSlice::check`] 负责.
    pub fn new(data: Array2<f32>, spacing: Spacing) -> Self {
        let affine = Affine::from_spacing(spacing);
        Self {
            data,
            spacing,
            affine,
        }
    }

    /// 打开 nii 文件格式的 2D CT 切片. `path` 为 `.nii` 或 `.nii.gz` 文件的本地路径.
    ///
    /// 数据可以是 `[W, H]` 或 `[W, H, 1, ...]`; 其他形状返回 `InputError::NotPlanar`.
    /// 像素分辨率取自 `pixdim[1]` 和 `pixdim[2]`, 仿射变换见 [`Affine`] 的读取规则.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = obj.header().clone();
        let spacing = Spacing::new(header.pixdim[1] as f64, header.pixdim[2] as f64);
        let affine = Affine::from_header(&header, spacing);

        // [W, H, ...] -> [..., H, W].
        // hint: 原第一维向下增长, 原第二维向右增长.
        let data = obj.into_volume().into_ndarray::<f32>()?.reversed_axes();
        let data = planar(data)?;

        Ok(Self {
            data,
            spacing,
            affine,
        })
    }

    /// 读取 `.npy` 格式的 2D HU 数组. npy 文件不携带分辨率信息, 因此需要由调用者给出.
    ///
    /// 数组按 `(H, W)` 行优先解释, 支持 `f32` 和 `f64` 两种元素类型.
    pub fn from_npy<P: AsRef<Path>>(path: P, spacing: Spacing) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let data: ArrayD<f32> = match ndarray_npy::read_npy::<_, ArrayD<f32>>(path) {
            Ok(v) => v,
            Err(ReadNpyError::WrongDescriptor(_)) => {
                ndarray_npy::read_npy::<_, ArrayD<f64>>(path)?.mapv(|v| v as f32)
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self::new(planar(data)?, spacing))
    }

    /// 检查切片是否可以进入分割流程.
    pub fn check(&self) -> Result<(), InputError> {
        if self.data.is_empty() {
            return Err(InputError::Empty);
        }
        self.spacing.check()
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 像素分辨率.
    #[inline]
    pub fn spacing(&self) -> Spacing {
        self.spacing
    }

    /// 仿射变换.
    #[inline]
    pub fn affine(&self) -> &Affine {
        &self.affine
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    /// 获取给定位置 (高, 宽) 的 HU 值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&f32> {
        self.data.get(pos)
    }

    /// 以行优先规则, 获取能迭代图像所有 `(索引, CT HU 值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &f32)> {
        self.data.indexed_iter()
    }

    /// 将整张切片裁剪到 `window` 的范围内, 不做缩放.
    pub fn windowed(&self, window: &CtWindow) -> Array2<f32> {
        self.data.mapv(|hu| window.clip(hu))
    }

    /// 按照 `window` 将整张切片转换为 8-bit 灰度. 无意义的值 (NaN) 映射为黑色.
    pub fn display(&self, window: &CtWindow) -> Array2<u8> {
        self.data.mapv(|hu| window.eval(hu).unwrap_or(u8::MIN))
    }
}
