//! 运行时错误.

use crate::{Idx3d, Idx3dF};
use thiserror::Error;

/// 网格重建 (测地路径, 插值, 混合网格, 吸附) 的运行时错误.
///
/// 所有错误都同步返回给直接调用者, 内部不做任何重试.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// 角点个数不足 / 过多, 或角点退化 (重合, 共线).
    #[error("invalid corners: {0}")]
    InvalidCorners(String),

    /// 坐标或其搜索窗口超出体数据范围.
    ///
    /// 第一个参数是越界的 (下界, 上界) 请求, 第二个参数是体数据形状.
    #[error("window {0:?} exceeds volume of shape {1:?}")]
    OutOfBounds((Idx3dF, Idx3dF), Idx3d),

    /// Dijkstra 搜索耗尽前沿仍未到达终点, 或端点不在图中.
    #[error("no finite-cost path from {0:?} to {1:?}")]
    NoPathFound(Idx3d, Idx3d),

    /// 电极分割中不存在值大于 1 的体素.
    #[error("segmentation contains no electrode voxel")]
    EmptySegmentation,

    /// 网格行数/列数无法构成网格. `(rows, cols)`.
    #[error("degenerate grid shape {0} x {1}")]
    DegenerateGrid(usize, usize),

    /// 重建参数不合法 (例如从配置文件读入的非正步长).
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// 网格重建运行时结果.
pub type GridResult<T> = Result<T, GridError>;

impl GridError {
    /// 以整数窗口构建 `OutOfBounds`. 下界可能为负, 因此以 `i64` 传入.
    pub(crate) fn window_out_of_bounds(lo: [i64; 3], hi: [i64; 3], shape: Idx3d) -> Self {
        let f = |v: [i64; 3]| (v[0] as f64, v[1] as f64, v[2] as f64);
        Self::OutOfBounds((f(lo), f(hi)), shape)
    }

    /// 以单个实数坐标构建 `OutOfBounds`.
    pub(crate) fn point_out_of_bounds(p: Idx3dF, shape: Idx3d) -> Self {
        Self::OutOfBounds((p, p), shape)
    }
}
