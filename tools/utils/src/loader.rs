//! 对 `lung-berry::dataset` 的更一层封装. 提供更直接的切片目录加载器.

use lung_berry::dataset::{self, SliceDir};
use lung_berry::error::LoadError;
use std::env;
use std::path::{Path, PathBuf};

/// 指定切片目录的环境变量.
pub const IMAGE_DIR_ENV: &str = "LUNG_CT_DIR";

/// 获取肺部 CT 切片目录.
///
/// 1. 若环境变量 `$LUNG_CT_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/lung/Images`. 无法确定用户主目录时返回 `None`.
pub fn image_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var(IMAGE_DIR_ENV) {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => dataset::home_dataset_dir_with(["lung", "Images"]),
    }
}

/// 获取 `dir` 下文件名以 `prefix` 开头的切片.
#[inline]
pub fn slice_dir<P: AsRef<Path>>(dir: P, prefix: &str) -> Result<SliceDir, LoadError> {
    SliceDir::open(dir, prefix)
}
