//! 电极吸附.
//!
//! 插值得到的坐标只是估计值. 本模块把每个候选坐标吸附到电极分割 (值 `> 1` 的体素)
//! 中欧氏距离最近的体素上. 距离相同时取扫描顺序 (行优先) 中靠前的体素.

use crate::consts::label::is_electrode;
use crate::interpol::{distance, to_f64};
use crate::{GridError, GridResult, Idx3d, Idx3dF};
use log::{debug, trace};
use ndarray::ArrayView3;
use ordered_float::OrderedFloat;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    }
}

/// 扫描过一次的电极分割, 可对多组候选坐标重复吸附.
#[derive(Debug, Clone)]
pub struct Snapper {
    /// 电极体素, 按扫描顺序.
    voxels: Vec<Idx3d>,
}

impl Snapper {
    /// 扫描 `segmentation`, 收集所有值 `> 1` 的体素.
    ///
    /// 不存在这样的体素时返回 `GridError::EmptySegmentation`.
    pub fn new(segmentation: ArrayView3<u8>) -> GridResult<Self> {
        let voxels: Vec<Idx3d> = segmentation
            .indexed_iter()
            .filter(|(_, v)| is_electrode(**v))
            .map(|(idx, _)| idx)
            .collect();
        if voxels.is_empty() {
            return Err(GridError::EmptySegmentation);
        }
        debug!("snapper: {} electrode voxels", voxels.len());
        Ok(Self { voxels })
    }

    /// 电极体素个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// 永远为 `false`, 构造时已排除空分割.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// 电极体素, 按扫描顺序.
    #[inline]
    pub fn voxels(&self) -> &[Idx3d] {
        &self.voxels
    }

    /// 距 `p` 最近的电极体素, 以及距离.
    pub fn nearest(&self, p: Idx3dF) -> (Idx3d, f64) {
        let (v, d2) = self
            .voxels
            .iter()
            .map(|v| {
                let (a, b, c) = to_f64(*v);
                (*v, (a - p.0).powi(2) + (b - p.1).powi(2) + (c - p.2).powi(2))
            })
            .min_by_key(|(_, d2)| OrderedFloat(*d2))
            .unwrap_or(((0, 0, 0), f64::INFINITY));
        trace!("snap {p:?} -> {v:?}");
        (v, d2.sqrt())
    }

    /// 每个候选坐标吸附后的体素, 与输入一一对应.
    pub fn snap(&self, candidates: &[Idx3dF]) -> Vec<Idx3d> {
        self.snap_with_distance(candidates)
            .into_iter()
            .map(|(v, _)| v)
            .collect()
    }

    /// 每个候选坐标吸附后的体素及吸附距离, 与输入一一对应.
    pub fn snap_with_distance(&self, candidates: &[Idx3dF]) -> Vec<(Idx3d, f64)> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                candidates.par_iter().map(|p| self.nearest(*p)).collect()
            } else {
                candidates.iter().map(|p| self.nearest(*p)).collect()
            }
        }
    }
}

/// 一次性吸附. 见 [`Snapper`].
pub fn snap(candidates: &[Idx3dF], segmentation: ArrayView3<u8>) -> GridResult<Vec<Idx3d>> {
    Ok(Snapper::new(segmentation)?.snap(candidates))
}

/// 一组吸附结果的平均吸附距离. 空输入返回 `None`.
pub fn mean_distance(snapped: &[(Idx3d, f64)]) -> Option<f64> {
    (!snapped.is_empty())
        .then(|| snapped.iter().map(|(_, d)| d).sum::<f64>() / snapped.len() as f64)
}

/// `p` 与体素 `v` 的距离.
#[inline]
pub fn snap_distance(p: Idx3dF, v: Idx3d) -> f64 {
    distance(p, to_f64(v))
}

#[cfg(test)]
mod tests {
    use super::{mean_distance, snap, snap_distance, Snapper};
    use crate::interpol::to_f64;
    use crate::GridError;
    use ndarray::{s, Array3};

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-8
    }

    /// 三个 2x2x2 的电极触点.
    fn contacts() -> Array3<u8> {
        let mut m = Array3::<u8>::zeros((20, 20, 20));
        // 值为 1 的体素不是电极.
        m.slice_mut(s![.., .., 0..2]).fill(1);
        m.slice_mut(s![2..4, 2..4, 2..4]).fill(2);
        m.slice_mut(s![10..12, 2..4, 2..4]).fill(3);
        m.slice_mut(s![10..12, 12..14, 15..17]).fill(2);
        m
    }

    /// 吸附已经在电极上的坐标得到其本身.
    #[test]
    fn test_idempotent() {
        let m = contacts();
        let snapper = Snapper::new(m.view()).unwrap();
        assert_eq!(snapper.len(), 24);
        for v in snapper.voxels().to_vec() {
            let (got, d) = snapper.nearest(to_f64(v));
            assert_eq!(got, v);
            assert_eq!(d, 0.0);
        }
    }

    #[test]
    fn test_snap_nearest() {
        let m = contacts();
        let candidates = [(0.0, 0.0, 0.0), (7.4, 2.5, 2.5), (11.0, 12.5, 10.0)];
        let got = snap(&candidates, m.view()).unwrap();
        assert_eq!(got, vec![(2, 2, 2), (10, 2, 2), (11, 12, 15)]);

        let snapper = Snapper::new(m.view()).unwrap();
        let with_d = snapper.snap_with_distance(&candidates);
        for ((p, (v, d)), q) in candidates.iter().zip(&with_d).zip(&got) {
            assert_eq!(v, q);
            assert!(f64_eq(*d, snap_distance(*p, *v)));
        }
        assert!(f64_eq(
            mean_distance(&with_d).unwrap(),
            with_d.iter().map(|(_, d)| d).sum::<f64>() / 3.0
        ));
        assert_eq!(mean_distance(&[]), None);
    }

    /// 距离相同时取扫描顺序中靠前的体素.
    #[test]
    fn test_tie_scan_order() {
        let mut m = Array3::<u8>::zeros((5, 5, 5));
        m[[2, 0, 0]] = 2;
        m[[0, 0, 2]] = 2;
        let got = snap(&[(1.0, 0.0, 1.0)], m.view()).unwrap();
        assert_eq!(got, vec![(0, 0, 2)]);
    }

    #[test]
    fn test_empty_segmentation() {
        let mut m = Array3::<u8>::zeros((5, 5, 5));
        m.fill(1);
        assert_eq!(
            snap(&[(1.0, 1.0, 1.0)], m.view()),
            Err(GridError::EmptySegmentation)
        );
    }

    /// 同一个 `Snapper` 可以在多个线程中同时使用.
    #[test]
    fn test_shared_across_threads() {
        use rayon::prelude::*;

        let m = contacts();
        let snapper = Snapper::new(m.view()).unwrap();
        let sets: Vec<Vec<_>> = (0..16)
            .map(|i| vec![(i as f64, 2.5, 2.5), (10.5, 12.5, i as f64)])
            .collect();
        let parallel: Vec<_> = sets.par_iter().map(|c| snapper.snap(c)).collect();
        let sequential: Vec<_> = sets.iter().map(|c| snapper.snap(c)).collect();
        assert_eq!(parallel, sequential);
    }

    /// 输出与输入一一对应, 包括重复的候选坐标.
    #[test]
    fn test_output_order() {
        let m = contacts();
        let candidates = vec![(11.0, 3.0, 3.0), (2.0, 2.0, 2.0), (11.0, 3.0, 3.0)];
        let got = snap(&candidates, m.view()).unwrap();
        assert_eq!(got.len(), 3);
        assert_eq!(got[0], got[2]);
        assert_eq!(got[1], (2, 2, 2));
    }
}
