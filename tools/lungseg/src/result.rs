//! 批处理结果汇总.

use lung_berry::pipeline::BatchReport;
use std::collections::BTreeMap;
use std::io::{self, Write};

#[inline]
fn f64_to_display(f: Option<f64>) -> String {
    match f {
        Some(f) => format!("{f:.6}"),
        None => "/".to_string(),
    }
}

/// 将 `report` 的结果写进 `w` 中.
fn describe_into<W: Write>(report: &BatchReport, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Batch of {} slices:", report.results.len())?;
    writeln!(w, "{S4}Processed: {}", report.processed())?;
    writeln!(w, "{S4}Failed: {}", report.failed())?;

    let mut by_label = BTreeMap::new();
    for r in report.results.iter().filter(|r| !r.is_processed()) {
        *by_label.entry(r.status_label()).or_insert(0usize) += 1;
    }
    for (label, n) in by_label {
        writeln!(w, "{S4}{S4}{label}: {n}")?;
    }

    writeln!(
        w,
        "{S4}Average lung area: {}",
        f64_to_display(report.mean_lung_area())
    )?;
    writeln!(
        w,
        "{S4}Average vessel ratio: {} %",
        f64_to_display(report.mean_vessel_ratio())
    )?;
    writeln!(w, "{S4}Mask sink errors: {}", report.sink_errors)?;
    writeln!(w, "{S4}Total time: {} ms", report.elapsed.as_millis())?;
    match report.slowest() {
        Some(r) => write!(
            w,
            "{S4}Most time-consuming slice `{}` costs {} us",
            r.slice_id,
            r.elapsed.as_micros()
        )?,
        None => write!(w, "{S4}Most time-consuming slice costs / us")?,
    }
    Ok(())
}

/// 最终结果.
pub struct Summary<'a> {
    report: &'a BatchReport,
}

impl<'a> Summary<'a> {
    pub fn new(report: &'a BatchReport) -> Self {
        Self { report }
    }

    /// 分析运行结果, 输出到标准输出.
    pub fn analyze(&self) {
        if let Err(e) = self.write_to(io::stdout().lock()) {
            eprintln!("[ERROR] {e}");
        }
    }

    /// 将结果连同上下分隔线一起写进 `w`.
    fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        utils::sep_to(&mut w)?;
        describe_into(self.report, &mut w)?;
        writeln!(w)?;
        utils::sep_to(&mut w)
    }
}
