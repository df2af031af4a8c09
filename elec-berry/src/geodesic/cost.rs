//! 表面体素代价表.
//!
//! 一个表面体素 (mask 值为 1) 的 "邻接背景数" 是其邻域 (3D 为 26-邻域, 2D 为 8-邻域,
//! 均被搜索窗口裁剪) 中 mask 值为 0 的体素个数. 邻接背景数越多, 说明体素越靠近表面的薄边,
//! 代价越低; 邻接背景数越少 (深处或孤立), 代价越高.

use once_cell::sync::Lazy;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 代价等级. 数值越大越 "昂贵".
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CostClass {
    /// 等级 1.
    C1 = 1,
    /// 等级 2.
    C2 = 2,
    /// 等级 3. 默认 3D 表中用于邻接背景数 `>= 5` 的体素.
    C3 = 3,
    /// 等级 4.
    C4 = 4,
    /// 等级 5.
    C5 = 5,
    /// 等级 6. 默认 3D 表中用于邻接背景数为 0 的体素.
    C6 = 6,
}

impl CostClass {
    /// 全部等级, 升序.
    pub const ALL: [CostClass; 6] = [
        CostClass::C1,
        CostClass::C2,
        CostClass::C3,
        CostClass::C4,
        CostClass::C5,
        CostClass::C6,
    ];

    /// 等级在权重数组中的下标.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize - 1
    }
}

/// 将邻接背景数映射到代价等级, 再将代价等级映射到边权重.
///
/// 规则按 `min_count` 降序排列, 第一个满足 `count >= min_count` 的规则生效.
/// 构造时保证存在 `min_count == 0` 的规则, 因此每个表面体素都有确定的等级.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "RawCostTable", into = "RawCostTable")
)]
pub struct CostTable {
    rules: Vec<(u32, CostClass)>,
    weights: [f64; 6],
}

/// 未经检查的代价表, 只用于序列化. 反序列化时经由 [`CostTable::new`] 检查.
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct RawCostTable {
    rules: Vec<(u32, CostClass)>,
    weights: [f64; 6],
}

#[cfg(feature = "serde")]
impl TryFrom<RawCostTable> for CostTable {
    type Error = String;

    fn try_from(raw: RawCostTable) -> Result<Self, Self::Error> {
        let msg = format!("invalid cost table: rules {:?}, weights {:?}", raw.rules, raw.weights);
        CostTable::new(raw.rules, raw.weights).ok_or(msg)
    }
}

#[cfg(feature = "serde")]
impl From<CostTable> for RawCostTable {
    fn from(t: CostTable) -> Self {
        Self {
            rules: t.rules,
            weights: t.weights,
        }
    }
}

static DEFAULT_3D: Lazy<CostTable> = Lazy::new(|| CostTable {
    rules: vec![
        (5, CostClass::C3),
        (3, CostClass::C4),
        (1, CostClass::C5),
        (0, CostClass::C6),
    ],
    weights: [1.0, 1.0, 2.0, 4.0, 5.0, 6.0],
});

static DEFAULT_2D: Lazy<CostTable> = Lazy::new(|| CostTable {
    rules: vec![(4, CostClass::C3), (2, CostClass::C4), (0, CostClass::C5)],
    weights: [1.0, 4.0, 9.0, 16.0, 25.0, 36.0],
});

impl Default for CostTable {
    #[inline]
    fn default() -> Self {
        Self::default_3d()
    }
}

impl CostTable {
    /// 构建代价表.
    ///
    /// 当 `rules` 中不存在 `min_count == 0` 的规则, 规则不满足单调性
    /// (邻接背景数越多等级越高), 或 `weights` 中存在负数 / 非有限值时, 返回 `None`.
    pub fn new(mut rules: Vec<(u32, CostClass)>, weights: [f64; 6]) -> Option<Self> {
        if !weights.iter().all(|w| w.is_finite() && *w >= 0.0) {
            return None;
        }
        rules.sort_by(|a, b| b.0.cmp(&a.0));
        rules.dedup_by_key(|r| r.0);
        if rules.last().map(|r| r.0) != Some(0) {
            return None;
        }
        // 降序的 min_count 对应的等级必须不降.
        if rules.windows(2).any(|w| w[0].1 > w[1].1) {
            return None;
        }
        Some(Self { rules, weights })
    }

    /// 3D 默认代价表.
    ///
    /// | 邻接背景数 | 等级 | 权重 |
    /// |---|---|---|
    /// | 0 | 6 | 6 |
    /// | 1..=2 | 5 | 5 |
    /// | 3..=4 | 4 | 4 |
    /// | >= 5 | 3 | 2 |
    #[inline]
    pub fn default_3d() -> Self {
        DEFAULT_3D.clone()
    }

    /// 2D 默认代价表. 平方权重.
    ///
    /// | 邻接背景数 | 等级 | 权重 |
    /// |---|---|---|
    /// | 0..=1 | 5 | 25 |
    /// | 2..=3 | 4 | 16 |
    /// | >= 4 | 3 | 9 |
    #[inline]
    pub fn default_2d() -> Self {
        DEFAULT_2D.clone()
    }

    /// 求邻接背景数为 `zero_count` 的表面体素的等级.
    #[inline]
    pub fn classify(&self, zero_count: u32) -> CostClass {
        self.rules
            .iter()
            .find(|(min, _)| zero_count >= *min)
            .map(|(_, class)| *class)
            .unwrap_or(CostClass::C6)
    }

    /// 进入等级为 `class` 的体素的边权重.
    #[inline]
    pub fn weight(&self, class: CostClass) -> f64 {
        self.weights[class.index()]
    }

    /// 规则 `(min_count, class)`, 按 `min_count` 降序.
    #[inline]
    pub fn rules(&self) -> &[(u32, CostClass)] {
        &self.rules
    }

    /// 所有权重同乘 `factor` (`factor >= 0`). `factor > 1` 时得到更 "严格" 的代价表.
    pub fn scaled(&self, factor: f64) -> Self {
        assert!(factor.is_finite() && factor >= 0.0);
        Self {
            rules: self.rules.clone(),
            weights: self.weights.map(|w| w * factor),
        }
    }

    /// 替换某一等级的权重.
    pub fn with_weight(mut self, class: CostClass, weight: f64) -> Self {
        assert!(weight.is_finite() && weight >= 0.0);
        self.weights[class.index()] = weight;
        self
    }
}
