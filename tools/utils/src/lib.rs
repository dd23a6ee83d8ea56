//! 命令行工具依赖的通用组件.

use lung_berry::CtWindow;

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep_to<W: std::io::Write>(mut w: W) -> std::io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 创建一般情况下合适的、用于可视化胸部 CT 肺部扫描的窗口.
/// 该窗口窗位为 -600, 窗宽为 1500.
#[inline]
pub fn lung_window() -> CtWindow {
    CtWindow::from_lung_visual()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sep_to() {
        let mut buf = vec![];
        sep_to(&mut buf).unwrap();
        assert_eq!(buf.len(), SEP.len() + 1);
    }

    #[test]
    fn test_lung_window() {
        let w = lung_window();
        assert_eq!(w.level(), -600.0);
        assert_eq!(w.width(), 1500.0);
        assert!(cpus() >= 1);
    }
}
