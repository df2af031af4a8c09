//! 混合网格.
//!
//! 网格的两条长边 ("rail", `A -> C` 与 `B -> D`) 沿 mask 表面的测地路径生成,
//! 再各自重采样为 `m` 个点; 第 `i` 行 ("rung") 是两条 rail 上第 `i` 个点之间的 `n` 点直线插值.
//! 这样网格的边缘贴合颅骨表面, 而每一行仍保持电极片本身的刚性.
//!
//! 网格按行优先输出, 每个点恰好出现一次: 第 `i` 行第 0 列在 rail `A -> C` 上,
//! 第 `n - 1` 列在 rail `B -> D` 上. 与 [`crate::interpolate`] 的 4 角点模式方向一致.

use crate::geodesic::PathSolver;
use crate::interpol::{lerp, strip_with_count, to_f64, ElectrodeGrid, GridKind};
use crate::{GridError, GridResult, Idx3d, Idx3dF};
use log::debug;
use ndarray::ArrayView3;

/// 将一条路径按 "下标弧长" 重采样为 `m` 个点, 两端点均保留.
///
/// 第 `i` 个点位于下标 `i * (L - 1) / (m - 1)` 处, `L` 为路径点个数.
/// 下标为整数时直接取路径点, 否则在相邻两个路径点之间线性插值.
/// 位置以整数比计算, 不累积浮点误差.
///
/// `path` 为空时程序 panic. `m == 0` 时返回空序列, `m == 1` 时只返回起点.
pub fn resample_rail(path: &[Idx3d], m: usize) -> Vec<Idx3dF> {
    assert!(!path.is_empty());
    match m {
        0 => return vec![],
        1 => return vec![to_f64(path[0])],
        _ => {}
    }
    let last = path.len() - 1;
    let den = m - 1;
    (0..m)
        .map(|i| {
            let num = i * last;
            let (f, rem) = (num / den, num % den);
            if rem == 0 || f >= last {
                to_f64(path[f.min(last)])
            } else {
                let e = rem as f64 / den as f64;
                lerp(to_f64(path[f]), to_f64(path[f + 1]), e)
            }
        })
        .collect()
}

/// 以两条 rail 生成 `m x n` 的网格.
fn grid_from_rails(rail_ac: &[Idx3dF], rail_bd: &[Idx3dF], n: usize) -> GridResult<ElectrodeGrid> {
    debug_assert_eq!(rail_ac.len(), rail_bd.len());
    let m = rail_ac.len();
    let mut points = Vec::with_capacity(m * n);
    for (start, end) in rail_ac.iter().zip(rail_bd) {
        points.extend(strip_with_count(*start, *end, n)?.into_points());
    }
    Ok(ElectrodeGrid::new(GridKind::Grid, m, n, points))
}

#[inline]
fn check_shape(m: usize, n: usize) -> GridResult<()> {
    if m < 2 || n < 2 {
        return Err(GridError::DegenerateGrid(m, n));
    }
    Ok(())
}

impl PathSolver {
    /// 混合网格: 两条 rail 均沿 `mask` 表面.
    ///
    /// 任意一条 rail 的路径搜索失败时整个构建失败, 不返回部分结果.
    #[allow(clippy::too_many_arguments)]
    pub fn hybrid_grid(
        &self,
        a: Idx3d,
        b: Idx3d,
        c: Idx3d,
        d: Idx3d,
        m: usize,
        n: usize,
        mask: ArrayView3<u8>,
    ) -> GridResult<ElectrodeGrid> {
        check_shape(m, n)?;
        let ac = self.find_path_3d(a, c, mask)?;
        let bd = self.find_path_3d(b, d, mask)?;
        debug!(
            "hybrid rails: {} / {} path points, cost {} / {}",
            ac.len(),
            bd.len(),
            ac.cost(),
            bd.cost()
        );
        grid_from_rails(
            &resample_rail(ac.points(), m),
            &resample_rail(bd.points(), m),
            n,
        )
    }

    /// 半混合网格: rail `A -> C` 沿 `mask` 表面, rail `B -> D` 为 `m` 点直线.
    #[allow(clippy::too_many_arguments)]
    pub fn half_hybrid_grid(
        &self,
        a: Idx3d,
        b: Idx3d,
        c: Idx3d,
        d: Idx3d,
        m: usize,
        n: usize,
        mask: ArrayView3<u8>,
    ) -> GridResult<ElectrodeGrid> {
        check_shape(m, n)?;
        let ac = self.find_path_3d(a, c, mask)?;
        debug!("half-hybrid rail: {} path points, cost {}", ac.len(), ac.cost());
        let bd = strip_with_count(to_f64(b), to_f64(d), m)?;
        grid_from_rails(&resample_rail(ac.points(), m), bd.points(), n)
    }
}

/// 使用默认配置构建混合网格. 见 [`PathSolver::hybrid_grid`].
#[inline]
pub fn build_hybrid_grid(
    a: Idx3d,
    b: Idx3d,
    c: Idx3d,
    d: Idx3d,
    m: usize,
    n: usize,
    mask: ArrayView3<u8>,
) -> GridResult<ElectrodeGrid> {
    PathSolver::default().hybrid_grid(a, b, c, d, m, n, mask)
}

/// 使用默认配置构建半混合网格. 见 [`PathSolver::half_hybrid_grid`].
#[inline]
pub fn build_half_hybrid_grid(
    a: Idx3d,
    b: Idx3d,
    c: Idx3d,
    d: Idx3d,
    m: usize,
    n: usize,
    mask: ArrayView3<u8>,
) -> GridResult<ElectrodeGrid> {
    PathSolver::default().half_hybrid_grid(a, b, c, d, m, n, mask)
}
