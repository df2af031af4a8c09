//! 病例文件.
//!
//! 一个病例文件是一个 JSON 对象, 包含可选的全局 `config` 与若干病例:
//!
//! ```json
//! {
//!     "config": { "margin_ratio": 0.1 },
//!     "cases": [
//!         {
//!             "name": "HUP64_1",
//!             "mode": "hybrid",
//!             "grid": "8x8",
//!             "corners": { "A": [120, 88, 60], "B": [...], "C": [...], "D": [...] },
//!             "mask": "HUP64/HUP64_brain_mask.nii.gz",
//!             "segmentation": "HUP64/HUP64_unburied_electrode_seg.nii.gz"
//!         }
//!     ]
//! }
//! ```
//!
//! 角点既可以写成按名称排序的对象 (`A`, `B`, ...), 也可以写成有序数组.

use crate::error::{Result, ToolError};
use elec_berry::{Corners, GridSpec, Idx3dF, ReconConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// 重建方式.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// 2 角点条带.
    Strip,

    /// 3 或 4 角点网格, 直线插值.
    Grid,

    /// 4 角点混合网格, 两条 rail 均沿表面.
    Hybrid,

    /// 4 角点半混合网格, 只有 `A -> C` 沿表面.
    HalfHybrid,
}

impl Mode {
    /// 是否需要表面 mask.
    #[inline]
    pub fn needs_mask(self) -> bool {
        matches!(self, Self::Hybrid | Self::HalfHybrid)
    }
}

/// 角点列表.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CornerList {
    /// 有序数组.
    Ordered(Vec<[f64; 3]>),

    /// 以名称为键, 按名称排序.
    Named(BTreeMap<String, [f64; 3]>),
}

impl CornerList {
    /// 按顺序展开.
    pub fn points(&self) -> Vec<Idx3dF> {
        let to = |[a, b, c]: [f64; 3]| (a, b, c);
        match self {
            Self::Ordered(v) => v.iter().copied().map(to).collect(),
            Self::Named(m) => m.values().copied().map(to).collect(),
        }
    }
}

fn default_snap() -> bool {
    true
}

/// 一个病例.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    /// 病例名, 同时也是输出文件名前缀.
    pub name: String,

    /// 重建方式.
    pub mode: Mode,

    /// 角点.
    pub corners: CornerList,

    /// 网格形状, 形如 `"8x8"` (行 x 列). 条带可写 `"1x6"` 或 `"6"`.
    #[serde(default)]
    pub grid: Option<String>,

    /// 固定步长. 与 `grid` 二选一, 仅用于 `strip` 和 `grid`. 都不给出时使用配置中的默认步长.
    #[serde(default)]
    pub step: Option<f64>,

    /// 表面 mask 文件. 混合模式必需.
    #[serde(default)]
    pub mask: Option<PathBuf>,

    /// 电极分割文件. 给出时用于吸附.
    #[serde(default)]
    pub segmentation: Option<PathBuf>,

    /// 是否吸附到电极分割.
    #[serde(default = "default_snap")]
    pub snap: bool,

    /// 本病例专用的配置, 覆盖全局配置.
    #[serde(default)]
    pub config: Option<ReconConfig>,
}

/// 病例文件.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseFile {
    /// 全局配置.
    #[serde(default)]
    pub config: Option<ReconConfig>,

    /// 全部病例.
    pub cases: Vec<Case>,
}

impl CaseFile {
    /// 从 JSON 文件读取.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// 从 JSON 字符串读取.
    #[inline]
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// 病例 `case` 实际使用的配置.
    pub fn config_for(&self, case: &Case) -> ReconConfig {
        case.config
            .clone()
            .or_else(|| self.config.clone())
            .unwrap_or_default()
    }
}

/// 解析 `"MxN"` 形式的网格形状. 单个数字 `"N"` 视为 `1 x N`.
pub fn parse_grid_shape(s: &str) -> Option<(usize, usize)> {
    let s = s.trim();
    match s.split_once(|c: char| matches!(c, 'x' | 'X' | '*')) {
        Some((m, n)) => Some((m.trim().parse().ok()?, n.trim().parse().ok()?)),
        None => Some((1, s.parse().ok()?)),
    }
}

/// 校验后的重建计划.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// 重建方式.
    pub mode: Mode,

    /// 角点, 按输入顺序.
    pub corners: Vec<Idx3dF>,

    /// 插值规则.
    pub spec: GridSpec,
}

impl Case {
    fn bad(&self, reason: impl Into<String>) -> ToolError {
        ToolError::BadCase(self.name.clone(), reason.into())
    }

    /// 校验配置、角点个数、网格形状与所需文件, 不读取任何体数据.
    ///
    /// `strip` 与 `grid` 既没有 `grid` 也没有 `step` 时, 使用 `config` 中的默认步长.
    pub fn plan(&self, config: &ReconConfig) -> Result<Plan> {
        config.validate().map_err(|e| self.bad(e.to_string()))?;
        let corners = self.corners.points();
        let expected: &[usize] = match self.mode {
            Mode::Strip => &[2],
            Mode::Grid => &[3, 4],
            Mode::Hybrid | Mode::HalfHybrid => &[4],
        };
        if !expected.contains(&corners.len()) {
            return Err(self.bad(format!(
                "mode {:?} expects {expected:?} corners, got {}",
                self.mode,
                corners.len()
            )));
        }
        Corners::from_slice(&corners)?;

        let spec = match (&self.grid, self.step) {
            (Some(g), None) => {
                let (m, n) = parse_grid_shape(g)
                    .ok_or_else(|| self.bad(format!("cannot parse grid shape `{g}`")))?;
                GridSpec::with_count(m, n)
            }
            (None, Some(step)) if step.is_finite() && step > 0.0 => {
                if self.mode.needs_mask() {
                    return Err(self.bad("hybrid modes need a grid shape, not a step"));
                }
                GridSpec::with_step(step)
            }
            (None, Some(step)) => return Err(self.bad(format!("invalid step {step}"))),
            (Some(_), Some(_)) => return Err(self.bad("give either `grid` or `step`, not both")),
            (None, None) if !self.mode.needs_mask() => GridSpec::with_step(config.strip_step()),
            (None, None) => return Err(self.bad("hybrid modes need a grid shape")),
        };

        if self.mode.needs_mask() && self.mask.is_none() {
            return Err(self.bad("hybrid modes need a `mask`"));
        }
        if self.mask.is_none() && self.segmentation.is_none() {
            return Err(self.bad("need a `mask` or `segmentation` as the output reference"));
        }

        Ok(Plan {
            mode: self.mode,
            corners,
            spec,
        })
    }
}
