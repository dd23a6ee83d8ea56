#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供 2D 肺部 CT 水平切片的肺实质与肺血管分割, 以及逐切片的定量统计
//! (肺面积, 血管面积, 血管/肺面积比).
//!
//! 整个流程是纯几何/阈值的, 不涉及任何机器学习方法.
//!
//! # 注意
//!
//! 1. 该 crate 只处理单张 2D 切片, 不做任何跨切片 (3D) 的分割或配准.
//! 2. 每张切片的处理相互独立, 没有共享的可变状态, 因此可以安全地并行处理.
//! 3. 体数据容器格式 (nifti 等) 只在 [`CtSlice::open`] 和 [`sink`] 中出现,
//!   核心算法只接触 `ndarray` 二维数组和像素分辨率.
//!
//! # 开发计划
//!
//! ### CT window 视图 ✅
//!
//! 将 HU 值裁剪到给定窗口, 并可转换为 8-bit 灰度值.
//!
//! 实现位于 `lung-berry/src/data/window.rs`.
//!
//! ### 二值化与等值线提取 ✅
//!
//! 以肺部 HU 窗口 `[-1000, -300]` 二值化, 然后以 0.5 为等值线做 marching squares,
//! 只保留闭合的轮廓.
//!
//! 实现位于 `lung-berry/src/segment/binarize.rs` 和 `lung-berry/src/contour`.
//!
//! ### 肺轮廓选取 ✅
//!
//! 凸包面积 + 首尾闭合距离过滤, 并在候选多于两个时剔除最大的 (身体) 轮廓.
//!
//! 实现位于 `lung-berry/src/segment/select.rs`.
//!
//! ### 多边形光栅化, 面积计算 ✅
//!
//! 实现位于 `lung-berry/src/segment/{raster, area}.rs`.
//!
//! ### 血管提取与边缘去噪 ✅
//!
//! 肺掩膜与原图逐元素相乘, 背景赋值为空气 HU, 再以 `-500` 阈值提取血管.
//! 去噪时借助 k-d 树删除与肺轮廓点过近的血管像素.
//!
//! 实现位于 `lung-berry/src/segment/{vessel, kdtree}.rs`.
//!
//! ### 逐切片流程编排与批处理 ✅
//!
//! 实现位于 `lung-berry/src/pipeline`. 批处理借助 `rayon` 并行 (需要 `rayon` feature),
//! 结果最终按切片 id 排序.
//!
//! ### 结果持久化 ✅
//!
//! 掩膜以 nifti 格式保存 (前景为 255), 统计表以 CSV 格式保存.
//!
//! 实现位于 `lung-berry/src/sink.rs`.
//!
//! ### 批处理命令行工具 ✅
//!
//! 实现位于 `tools/lungseg`. 读取切片目录 (或生成合成切片), 保存掩膜, 统计表和预览图.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 高精度二维坐标 `(h, w)`. 轮廓点, 凸包顶点均以此表示.
pub type Idx2dF = (f64, f64);

pub mod consts;

mod data;

pub use data::{Affine, CtSlice, CtWindow, ImgWriteVis, Mask, SlicePhantom, Spacing};

pub mod contour;

pub mod dataset;

pub mod error;

pub mod pipeline;

pub mod prelude;

pub mod segment;

pub mod sink;
