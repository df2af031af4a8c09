//! 运行结果.

use crate::case::Mode;
use crate::error::Result;
use elec_berry::Idx3d;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

/// 单个病例的结果.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseReport {
    /// 重建方式.
    pub mode: Mode,

    /// 网格形状 `(rows, cols)`.
    pub shape: (usize, usize),

    /// 最终的电极体素坐标, 行优先.
    pub electrodes: Vec<Idx3d>,

    /// 平均吸附距离 (单位: 体素). 未吸附时为 `None`.
    pub mean_snap: Option<f64>,

    /// 耗时 (单位: 毫秒).
    pub elapsed_ms: f64,

    /// 输出的标记体文件.
    pub output: PathBuf,
}

/// 将病例 `name` 的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, r: &Result<CaseReport>, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        match f {
            Some(f) => format!("{f:.3}"),
            None => "/".to_string(),
        }
    }

    writeln!(w, "Case `{name}`:")?;
    match r {
        Ok(r) => {
            writeln!(w, "{S4}Mode: {:?}", r.mode)?;
            writeln!(w, "{S4}Shape: {} x {}", r.shape.0, r.shape.1)?;
            writeln!(w, "{S4}Electrodes: {}", r.electrodes.len())?;
            writeln!(w, "{S4}Mean snap distance: {}", f64_to_display(r.mean_snap))?;
            writeln!(w, "{S4}Elapsed: {:.1} ms", r.elapsed_ms)?;
            write!(w, "{S4}Output: {}", r.output.display())?;
        }
        Err(e) => write!(w, "{S4}Failed: {e}")?,
    }
    Ok(())
}

/// 全部病例的结果, 按病例文件中的顺序.
#[derive(Debug)]
pub struct Summary {
    data: Vec<(String, Result<CaseReport>)>,
}

impl Summary {
    /// 收集结果.
    pub fn from_iter<I: IntoIterator<Item = (String, Result<CaseReport>)>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }

    /// 病例个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 是否没有病例.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 失败的病例个数.
    pub fn failed(&self) -> usize {
        self.data.iter().filter(|(_, r)| r.is_err()).count()
    }

    /// 病例 `name` 的结果.
    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&Result<CaseReport>> {
        self.data.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    /// 将所有结果写进 `w` 中, 病例之间以分隔线隔开.
    pub fn describe<W: Write>(&self, w: &mut W) -> io::Result<()> {
        utils::sep_to(&mut *w)?;
        for (name, r) in self.data.iter() {
            describe_into(name, r, w)?;
            writeln!(w)?;
            utils::sep_to(&mut *w)?;
        }
        writeln!(w, "{} cases, {} failed", self.len(), self.failed())
    }

    /// 成功病例的结果, 以 JSON 写进 `w` 中.
    pub fn write_json<W: Write>(&self, w: W) -> serde_json::Result<()> {
        let ok: Vec<_> = self
            .data
            .iter()
            .filter_map(|(n, r)| r.as_ref().ok().map(|r| (n, r)))
            .collect();
        serde_json::to_writer_pretty(w, &ok)
    }
}

#[cfg(test)]
mod tests {
    use super::{CaseReport, Summary};
    use crate::case::Mode;
    use crate::error::ToolError;
    use std::path::PathBuf;

    fn report() -> CaseReport {
        CaseReport {
            mode: Mode::Grid,
            shape: (2, 2),
            electrodes: vec![(0, 0, 0), (0, 1, 0), (1, 0, 0), (1, 1, 0)],
            mean_snap: Some(0.5),
            elapsed_ms: 1.0,
            output: PathBuf::from("g_interpol.nii.gz"),
        }
    }

    #[test]
    fn test_describe() {
        let s = Summary::from_iter([
            ("g".to_string(), Ok(report())),
            (
                "h".to_string(),
                Err(ToolError::BadCase("h".into(), "missing `grid` or `step`".into())),
            ),
        ]);
        assert_eq!(s.failed(), 1);
        assert!(s.get("g").unwrap().is_ok());
        assert!(s.get("x").is_none());

        let mut buf = Vec::new();
        s.describe(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Case `g`:"));
        assert!(text.contains("Electrodes: 4"));
        assert!(text.contains("Mean snap distance: 0.500"));
        assert!(text.contains("Failed: case `h`"));
        assert!(text.ends_with("2 cases, 1 failed\n"));

        let mut json = Vec::new();
        s.write_json(&mut json).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 1);
        assert_eq!(v[0][0], "g");
        assert_eq!(v[0][1]["mode"], "grid");
    }
}
