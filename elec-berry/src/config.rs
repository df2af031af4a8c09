//! 重建参数.
//!
//! `ReconConfig::default()` 复现参考行为. 开启 `serde` feature 后可直接从 JSON 等格式加载.

use crate::consts::{
    label::MARKER, DEFAULT_MARKER_HALF_WIDTH, DEFAULT_STRIP_STEP, WINDOW_MARGIN_RATIO,
};
use crate::geodesic::CostTable;
use crate::{GridError, GridResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 重建参数.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReconConfig {
    /// 3D 测地路径代价表.
    cost_3d: CostTable,

    /// 2D 测地路径代价表.
    cost_2d: CostTable,

    /// 搜索窗口边距与两端点欧氏距离之比.
    margin_ratio: f64,

    /// 固定步长模式下的步长 (单位: 体素).
    strip_step: f64,

    /// 标记立方体半宽 (单位: 体素).
    marker_half_width: usize,

    /// 标记体素值.
    marker_value: u8,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            cost_3d: CostTable::default_3d(),
            cost_2d: CostTable::default_2d(),
            margin_ratio: WINDOW_MARGIN_RATIO,
            strip_step: DEFAULT_STRIP_STEP,
            marker_half_width: DEFAULT_MARKER_HALF_WIDTH,
            marker_value: MARKER,
        }
    }
}

impl ReconConfig {
    /// 替换 3D 代价表.
    #[inline]
    pub fn with_cost_3d(mut self, table: CostTable) -> Self {
        self.cost_3d = table;
        self
    }

    /// 替换 2D 代价表.
    #[inline]
    pub fn with_cost_2d(mut self, table: CostTable) -> Self {
        self.cost_2d = table;
        self
    }

    /// 设置窗口边距比例. `ratio` 必须非负且有限, 否则程序 panic.
    #[inline]
    pub fn with_margin_ratio(mut self, ratio: f64) -> Self {
        assert!(ratio.is_finite() && ratio >= 0.0);
        self.margin_ratio = ratio;
        self
    }

    /// 设置固定步长. `step` 必须为正且有限, 否则程序 panic.
    #[inline]
    pub fn with_strip_step(mut self, step: f64) -> Self {
        assert!(step.is_finite() && step > 0.0);
        self.strip_step = step;
        self
    }

    /// 设置标记立方体半宽和标记值.
    #[inline]
    pub fn with_marker(mut self, half_width: usize, value: u8) -> Self {
        self.marker_half_width = half_width;
        self.marker_value = value;
        self
    }

    /// 检查反序列化得到的参数. 代价表在反序列化时已经检查过.
    ///
    /// 步长必须为正且有限, 窗口边距比例必须非负且有限.
    pub fn validate(&self) -> GridResult<()> {
        if !(self.strip_step.is_finite() && self.strip_step > 0.0) {
            return Err(GridError::InvalidConfig(format!(
                "strip_step must be positive, got {}",
                self.strip_step
            )));
        }
        if !(self.margin_ratio.is_finite() && self.margin_ratio >= 0.0) {
            return Err(GridError::InvalidConfig(format!(
                "margin_ratio must be non-negative, got {}",
                self.margin_ratio
            )));
        }
        Ok(())
    }

    /// 3D 测地路径代价表.
    #[inline]
    pub fn cost_3d(&self) -> &CostTable {
        &self.cost_3d
    }

    /// 2D 测地路径代价表.
    #[inline]
    pub fn cost_2d(&self) -> &CostTable {
        &self.cost_2d
    }

    /// 窗口边距比例.
    #[inline]
    pub fn margin_ratio(&self) -> f64 {
        self.margin_ratio
    }

    /// 固定步长.
    #[inline]
    pub fn strip_step(&self) -> f64 {
        self.strip_step
    }

    /// 标记立方体半宽.
    #[inline]
    pub fn marker_half_width(&self) -> usize {
        self.marker_half_width
    }

    /// 标记值.
    #[inline]
    pub fn marker_value(&self) -> u8 {
        self.marker_value
    }
}

#[cfg(test)]
mod tests {
    use super::ReconConfig;
    use crate::geodesic::{CostClass, CostTable};
    use crate::GridError;

    #[test]
    fn test_default_config() {
        let c = ReconConfig::default();
        assert_eq!(c.margin_ratio(), 0.1);
        assert_eq!(c.strip_step(), 10.0);
        assert_eq!(c.marker_half_width(), 2);
        assert_eq!(c.marker_value(), 1);
        assert_eq!(c.cost_3d(), &CostTable::default_3d());
    }

    #[test]
    fn test_builder() {
        let t = CostTable::default_3d().with_weight(CostClass::C6, 100.0);
        let c = ReconConfig::default()
            .with_cost_3d(t.clone())
            .with_margin_ratio(0.2)
            .with_marker(1, 9);
        assert_eq!(c.cost_3d(), &t);
        assert_eq!(c.margin_ratio(), 0.2);
        assert_eq!(c.marker_value(), 9);
    }

    #[test]
    fn test_validate() {
        assert!(ReconConfig::default().validate().is_ok());

        let mut c = ReconConfig::default();
        c.strip_step = 0.0;
        assert!(matches!(c.validate(), Err(GridError::InvalidConfig(_))));
        c.strip_step = f64::NAN;
        assert!(c.validate().is_err());

        let mut c = ReconConfig::default();
        c.margin_ratio = -1.0;
        assert!(matches!(c.validate(), Err(GridError::InvalidConfig(_))));
        c.margin_ratio = f64::INFINITY;
        assert!(c.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_checked() {
        let c: ReconConfig = serde_json::from_str(r#"{ "strip_step": 0.0 }"#).unwrap();
        assert_eq!(c.margin_ratio(), 0.1);
        assert!(c.validate().is_err());

        let c: ReconConfig = serde_json::from_str(r#"{ "margin_ratio": -1.0 }"#).unwrap();
        assert!(c.validate().is_err());

        // 负权重的代价表在反序列化时就被拒绝.
        let bad = r#"{ "cost_3d": { "rules": [[0, "C6"]], "weights": [1, 1, 1, 1, 1, -5] } }"#;
        assert!(serde_json::from_str::<ReconConfig>(bad).is_err());

        let c: ReconConfig =
            serde_json::from_str(&serde_json::to_string(&ReconConfig::default()).unwrap()).unwrap();
        assert_eq!(c, ReconConfig::default());
    }

    #[test]
    #[should_panic]
    fn test_invalid_step() {
        let _ = ReconConfig::default().with_strip_step(0.0);
    }
}
