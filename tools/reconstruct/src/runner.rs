//! 程序运行函数.

use crate::case::{Case, CaseFile, Mode, Plan};
use crate::error::{Result, ToolError};
use crate::result::{CaseReport, Summary};
use elec_berry::snap::mean_distance;
use elec_berry::{
    interpolate, round_voxel, Corners, ElectrodeGrid, ElectrodeVolume, GridResult, Idx3d,
    PathSolver, ReconConfig, Snapper,
};
use log::{info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use utils::loader;

/// 输出标记体的文件名.
#[inline]
pub fn output_name(case: &str) -> String {
    format!("{case}_interpol.nii.gz")
}

/// 批量重建.
#[derive(Debug, Clone)]
pub struct Runner {
    /// 病例中相对路径的根目录.
    data_dir: PathBuf,

    /// 输出目录.
    out_dir: PathBuf,

    /// 是否并行处理多个病例.
    parallel: bool,
}

impl Runner {
    /// 初始化.
    pub fn new(data_dir: PathBuf, out_dir: PathBuf, parallel: bool) -> Self {
        Self {
            data_dir,
            out_dir,
            parallel,
        }
    }

    /// 输出目录.
    #[inline]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// 处理 `file` 中的全部病例. 单个病例失败不影响其他病例.
    pub fn run_all(&self, file: &CaseFile) -> Summary {
        let run = |case: &Case| (case.name.clone(), self.run_case(file, case));
        let results: Vec<_> = if self.parallel {
            file.cases.par_iter().map(run).collect()
        } else {
            file.cases.iter().map(run).collect()
        };
        Summary::from_iter(results)
    }

    /// 处理单个病例.
    pub fn run_case(&self, file: &CaseFile, case: &Case) -> Result<CaseReport> {
        let start = Instant::now();
        let config = file.config_for(case);
        let plan = case.plan(&config)?;

        let open = |f: &Option<PathBuf>| {
            f.as_ref()
                .map(|f| loader::open_volume(&self.data_dir, f))
                .transpose()
        };
        let mask = open(&case.mask)?;
        let segmentation = open(&case.segmentation)?;

        let grid = build_grid(&plan, &config, mask.as_ref())?;
        info!(
            "case `{}`: {:?} {:?} with {} electrodes",
            case.name,
            grid.kind(),
            grid.shape(),
            grid.len()
        );

        // 输出参考: 优先使用电极分割的 header 与形状.
        let reference = segmentation
            .as_ref()
            .or(mask.as_ref())
            .ok_or_else(|| ToolError::BadCase(case.name.clone(), "no reference volume".into()))?;

        let (voxels, mean_snap) = match (&segmentation, case.snap) {
            (Some(seg), true) => {
                let snapped = Snapper::new(seg.view())?.snap_with_distance(grid.points());
                let mean = mean_distance(&snapped);
                (snapped.into_iter().map(|(v, _)| v).collect(), mean)
            }
            (None, true) => {
                warn!("case `{}`: no segmentation, skip snapping", case.name);
                (grid.rounded(reference.shape())?, None)
            }
            (_, false) => (grid.rounded(reference.shape())?, None),
        };

        let mut out = reference.blank_like();
        out.mark_with(&voxels, &config);
        let output = self.out_dir.join(output_name(&case.name));
        out.save(&output)?;

        Ok(CaseReport {
            mode: plan.mode,
            shape: grid.shape(),
            electrodes: voxels,
            mean_snap,
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
            output,
        })
    }
}

/// 按计划构建网格. 混合模式的角点先取整到 `mask` 的体素上.
pub fn build_grid(
    plan: &Plan,
    config: &ReconConfig,
    mask: Option<&ElectrodeVolume>,
) -> Result<ElectrodeGrid> {
    if !plan.mode.needs_mask() {
        let corners = Corners::from_slice(&plan.corners)?;
        return Ok(interpolate(&corners, &plan.spec)?);
    }

    let mask = mask.ok_or_else(|| {
        ToolError::BadCase(format!("{:?}", plan.mode), "hybrid modes need a mask".into())
    })?;
    let shape = mask.shape();
    let v = plan
        .corners
        .iter()
        .map(|c| round_voxel(*c, shape))
        .collect::<GridResult<Vec<Idx3d>>>()?;
    let (m, n) = plan.spec.count().ok_or_else(|| {
        ToolError::BadCase(format!("{:?}", plan.mode), "hybrid modes need a grid shape".into())
    })?;

    let solver = PathSolver::new(config.clone());
    let grid = match plan.mode {
        Mode::Hybrid => solver.hybrid_grid(v[0], v[1], v[2], v[3], m, n, mask.view())?,
        _ => solver.half_hybrid_grid(v[0], v[1], v[2], v[3], m, n, mask.view())?,
    };
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::{build_grid, output_name, Runner};
    use crate::case::{CaseFile, Mode, Plan};
    use elec_berry::{ElectrodeVolume, GridSpec, ReconConfig};
    use ndarray::{s, Array3};

    /// 一块 20^3 的体数据, 在 `(10, 10, k)` (k = 2, 8, 14) 处各有一个 2^3 的电极.
    fn segmentation() -> ElectrodeVolume {
        let mut m = Array3::<u8>::zeros((20, 20, 20));
        for k in [2, 8, 14] {
            m.slice_mut(s![10..12, 10..12, k..k + 2]).fill(2);
        }
        ElectrodeVolume::from_array(m)
    }

    #[test]
    fn test_output_name() {
        assert_eq!(output_name("HUP64"), "HUP64_interpol.nii.gz");
    }

    #[test]
    fn test_build_grid_without_mask() {
        let plan = Plan {
            mode: Mode::Grid,
            corners: vec![(0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (0.0, 10.0, 0.0)],
            spec: GridSpec::with_count(3, 3),
        };
        let g = build_grid(&plan, &ReconConfig::default(), None).unwrap();
        assert_eq!(g.len(), 9);

        let plan = Plan {
            mode: Mode::Hybrid,
            corners: vec![(0.0, 0.0, 0.0); 4],
            spec: GridSpec::with_count(3, 3),
        };
        assert!(build_grid(&plan, &ReconConfig::default(), None).is_err());
    }

    /// 端到端: 条带插值, 吸附, 写出标记体.
    #[test]
    fn test_run_strip_case() {
        let dir = tempfile::tempdir().unwrap();
        segmentation().save(dir.path().join("seg.npy")).unwrap();

        let text = r#"{ "cases": [
            { "name": "s1", "mode": "strip", "grid": "3",
              "corners": [[10, 10, 2], [10, 10, 14]], "segmentation": "seg.npy" },
            { "name": "bad", "mode": "strip", "grid": "3",
              "corners": [[10, 10, 2], [10, 10, 14]], "segmentation": "missing.npy" },
            { "name": "zero-step", "mode": "strip", "config": { "strip_step": 0.0 },
              "corners": [[10, 10, 2], [10, 10, 14]], "segmentation": "seg.npy" }
        ] }"#;
        let file = CaseFile::from_json(text).unwrap();
        let runner = Runner::new(dir.path().to_path_buf(), dir.path().to_path_buf(), true);
        let summary = runner.run_all(&file);
        assert_eq!(summary.len(), 3);
        assert_eq!(summary.failed(), 2);
        assert!(summary.get("zero-step").unwrap().is_err());

        let report = summary.get("s1").unwrap().as_ref().unwrap();
        assert_eq!(report.electrodes, vec![(10, 10, 2), (10, 10, 8), (10, 10, 14)]);
        assert_eq!(report.mean_snap, Some(0.0));

        let out = ElectrodeVolume::open(dir.path().join(output_name("s1"))).unwrap();
        assert_eq!(out.shape(), (20, 20, 20));
        // 3 个互不重叠的 4^3 标记立方体.
        assert_eq!(out.count(1), 3 * 64);
        assert_eq!(out[(10, 10, 8)], 1);
    }
}
