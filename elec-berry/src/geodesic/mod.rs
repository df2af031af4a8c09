//! 沿 mask 表面的测地路径.
//!
//! 在起点与终点附近的局部搜索窗口上建立加权图, 以邻接背景数给表面体素分配代价,
//! 然后运行 Dijkstra 搜索. 这样得到的路径倾向于贴着 mask 的边界 (但在 mask 内部) 前进.

mod cost;
mod graph;
mod window;

use crate::{GridError, GridResult, Idx2d, Idx3d, ReconConfig};
use graph::WeightedGraph;
use log::debug;
use ndarray::{ArrayView2, ArrayView3, Axis};

pub use cost::{CostClass, CostTable};
pub use window::SearchWindow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一条从起点到终点 (均包含) 的路径, 以及其累计代价.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurfacePath<P = Idx3d> {
    points: Vec<P>,
    cost: f64,
}

impl<P: Copy> SurfacePath<P> {
    /// 路径上的点, 从起点到终点.
    #[inline]
    pub fn points(&self) -> &[P] {
        &self.points
    }

    /// 路径点个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 路径是否为空. 搜索成功的路径至少包含一个点.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 累计代价.
    #[inline]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// 起点.
    #[inline]
    pub fn start(&self) -> P {
        self.points[0]
    }

    /// 终点.
    #[inline]
    pub fn end(&self) -> P {
        self.points[self.points.len() - 1]
    }

    /// 直接获得内部数据的所有权.
    #[inline]
    pub fn into_points(self) -> Vec<P> {
        self.points
    }
}

/// 测地路径求解器. 持有代价表与窗口参数, 可重复使用.
#[derive(Clone, Debug, Default)]
pub struct PathSolver {
    config: ReconConfig,
}

impl PathSolver {
    /// 以给定配置初始化.
    #[inline]
    pub fn new(config: ReconConfig) -> Self {
        Self { config }
    }

    /// 当前配置.
    #[inline]
    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    /// 在 3D `mask` 上求 `start` 到 `end` 的最小代价路径.
    ///
    /// # 错误
    ///
    /// - 搜索窗口超出 `mask` 范围时返回 `GridError::OutOfBounds`;
    /// - 不存在有限代价路径时返回 `GridError::NoPathFound`.
    pub fn find_path_3d(
        &self,
        start: Idx3d,
        end: Idx3d,
        mask: ArrayView3<u8>,
    ) -> GridResult<SurfacePath> {
        self.solve(start, end, mask, false)
    }

    /// 在 2D `mask` 上求 `start` 到 `end` 的最小代价路径. 使用 8-邻接与 2D 代价表.
    pub fn find_path_2d(
        &self,
        start: Idx2d,
        end: Idx2d,
        mask: ArrayView2<u8>,
    ) -> GridResult<SurfacePath<Idx2d>> {
        let mask3 = mask.insert_axis(Axis(2));
        let path = self.solve((start.0, start.1, 0), (end.0, end.1, 0), mask3, true)?;
        Ok(SurfacePath {
            points: path.points.into_iter().map(|(i, j, _)| (i, j)).collect(),
            cost: path.cost,
        })
    }

    fn solve(
        &self,
        start: Idx3d,
        end: Idx3d,
        mask: ArrayView3<u8>,
        flat: bool,
    ) -> GridResult<SurfacePath> {
        let shape = mask.dim();
        let window =
            SearchWindow::around(start, end, shape, self.config.margin_ratio(), flat)?;
        let table = if flat {
            self.config.cost_2d()
        } else {
            self.config.cost_3d()
        };

        let graph = WeightedGraph::build(mask, window, table);
        debug!(
            "search window {:?}..={:?}: {} nodes, {} surface",
            window.lower(),
            window.upper(),
            window.len(),
            graph.surface_len()
        );

        let (points, cost) = graph
            .shortest_path(start, end)
            .ok_or(GridError::NoPathFound(start, end))?;
        debug!("path {start:?} -> {end:?}: {} points, cost {cost}", points.len());
        Ok(SurfacePath { points, cost })
    }
}

/// 使用默认配置, 在 3D `mask` 上求 `start` 到 `end` 的最小代价路径, 仅返回路径点.
#[inline]
pub fn find_path_3d(start: Idx3d, end: Idx3d, mask: ArrayView3<u8>) -> GridResult<Vec<Idx3d>> {
    PathSolver::default()
        .find_path_3d(start, end, mask)
        .map(SurfacePath::into_points)
}

/// 使用默认配置, 在 2D `mask` 上求 `start` 到 `end` 的最小代价路径, 仅返回路径点.
#[inline]
pub fn find_path_2d(start: Idx2d, end: Idx2d, mask: ArrayView2<u8>) -> GridResult<Vec<Idx2d>> {
    PathSolver::default()
        .find_path_2d(start, end, mask)
        .map(SurfacePath::into_points)
}
