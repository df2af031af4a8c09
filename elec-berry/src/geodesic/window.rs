//! 搜索窗口.

use crate::consts::FIXED_AXIS_MARGIN;
use crate::{GridError, GridResult, Idx3d};
use itertools::iproduct;

/// 体数据上与坐标轴对齐的子区域, 上下界均为闭区间.
///
/// 窗口由起点和终点确定: 两点不同的轴向外扩展 `ceil(ratio * 欧氏距离)` 个体素,
/// 两点重合的轴向外扩展固定的 1 个体素. `flat_layer` 为真时 (2D 情形)
/// 第三轴不扩展, 整个窗口只有一层.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SearchWindow {
    lo: [usize; 3],
    hi: [usize; 3],
}

impl SearchWindow {
    /// 在形状为 `shape` 的体数据上, 为 `start` 和 `end` 计算搜索窗口.
    ///
    /// 窗口超出体数据范围时返回 `Err(GridError::OutOfBounds)`, 不做截断.
    /// `ratio` 为负数或非有限值时返回 `Err(GridError::InvalidConfig)`.
    pub fn around(
        start: Idx3d,
        end: Idx3d,
        shape: Idx3d,
        ratio: f64,
        flat_layer: bool,
    ) -> GridResult<Self> {
        if !(ratio.is_finite() && ratio >= 0.0) {
            return Err(GridError::InvalidConfig(format!(
                "window margin ratio must be non-negative, got {ratio}"
            )));
        }
        let s = [start.0, start.1, start.2];
        let e = [end.0, end.1, end.2];
        let bound = [shape.0, shape.1, shape.2];

        let dist = s
            .iter()
            .zip(e.iter())
            .map(|(a, b)| (a.abs_diff(*b) as f64).powi(2))
            .sum::<f64>()
            .sqrt();
        let margin = (ratio * dist).ceil() as i64;

        let mut lo = [0i64; 3];
        let mut hi = [0i64; 3];
        for axis in 0..3 {
            let m = if flat_layer && axis == 2 {
                0
            } else if s[axis] == e[axis] {
                FIXED_AXIS_MARGIN as i64
            } else {
                margin
            };
            lo[axis] = s[axis].min(e[axis]) as i64 - m;
            hi[axis] = s[axis].max(e[axis]) as i64 + m;
        }

        let inside = (0..3).all(|a| lo[a] >= 0 && hi[a] < bound[a] as i64);
        if !inside {
            return Err(GridError::window_out_of_bounds(lo, hi, shape));
        }
        Ok(Self {
            lo: lo.map(|v| v as usize),
            hi: hi.map(|v| v as usize),
        })
    }

    /// 窗口形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        (
            self.hi[0] - self.lo[0] + 1,
            self.hi[1] - self.lo[1] + 1,
            self.hi[2] - self.lo[2] + 1,
        )
    }

    /// 窗口内体素个数.
    #[inline]
    pub fn len(&self) -> usize {
        let (a, b, c) = self.shape();
        a * b * c
    }

    /// 窗口是否为空. 构造出的窗口总是非空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 窗口下界 (全局坐标).
    #[inline]
    pub fn lower(&self) -> Idx3d {
        (self.lo[0], self.lo[1], self.lo[2])
    }

    /// 窗口上界 (全局坐标, 闭区间).
    #[inline]
    pub fn upper(&self) -> Idx3d {
        (self.hi[0], self.hi[1], self.hi[2])
    }

    /// 全局坐标 `p` 是否在窗口内.
    #[inline]
    pub fn contains(&self, (i, j, k): Idx3d) -> bool {
        (self.lo[0]..=self.hi[0]).contains(&i)
            && (self.lo[1]..=self.hi[1]).contains(&j)
            && (self.lo[2]..=self.hi[2]).contains(&k)
    }

    /// 全局坐标 -> 窗口内局部坐标. 调用者保证 `p` 在窗口内.
    #[inline]
    pub fn to_local(&self, (i, j, k): Idx3d) -> Idx3d {
        (i - self.lo[0], j - self.lo[1], k - self.lo[2])
    }

    /// 窗口内局部坐标 -> 全局坐标.
    #[inline]
    pub fn to_global(&self, (i, j, k): Idx3d) -> Idx3d {
        (i + self.lo[0], j + self.lo[1], k + self.lo[2])
    }

    /// 局部坐标 `p` 在窗口内的全部邻居 (局部坐标).
    ///
    /// 邻居即每轴偏移都在 `{-1, 0, 1}` 内、且不全为 0 的点, 窗口外的点被过滤掉.
    /// 单层窗口自然退化为 8-邻域.
    pub fn neighbours(&self, (i, j, k): Idx3d) -> impl Iterator<Item = Idx3d> {
        let (a, b, c) = self.shape();
        iproduct!(-1i64..=1, -1i64..=1, -1i64..=1)
            .filter(|d| *d != (0, 0, 0))
            .map(move |(di, dj, dk)| (i as i64 + di, j as i64 + dj, k as i64 + dk))
            .filter(move |&(x, y, z)| {
                (0..a as i64).contains(&x) && (0..b as i64).contains(&y) && (0..c as i64).contains(&z)
            })
            .map(|(x, y, z)| (x as usize, y as usize, z as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::SearchWindow;
    use crate::consts::{FIXED_AXIS_MARGIN, WINDOW_MARGIN_RATIO};
    use crate::interpol::{distance, strip_with_count, strip_with_step, to_f64};
    use crate::GridError;

    #[test]
    fn test_window_margin() {
        // 距离 20, 边距 2; 第二轴重合, 边距 1.
        let w = SearchWindow::around((10, 10, 10), (30, 10, 10), (50, 50, 50), 0.1, false).unwrap();
        assert_eq!(w.lower(), (8, 9, 9));
        assert_eq!(w.upper(), (32, 11, 11));
        assert_eq!(w.shape(), (25, 3, 3));
        assert!(w.contains((10, 10, 10)));
        assert!(w.contains((30, 10, 10)));
    }

    #[test]
    fn test_window_fractional_margin() {
        // 距离 sqrt(3 * 11^2) ~= 19.05, 边距 ceil(1.905) = 2.
        let w = SearchWindow::around((20, 20, 20), (9, 9, 9), (40, 40, 40), 0.1, false).unwrap();
        assert_eq!(w.lower(), (7, 7, 7));
        assert_eq!(w.upper(), (22, 22, 22));
    }

    #[test]
    fn test_window_out_of_bounds() {
        let e = SearchWindow::around((1, 5, 5), (20, 5, 5), (30, 30, 30), 0.1, false).unwrap_err();
        assert!(matches!(e, GridError::OutOfBounds(..)));

        let e = SearchWindow::around((5, 5, 5), (5, 5, 29), (30, 30, 30), 0.1, false).unwrap_err();
        assert!(matches!(e, GridError::OutOfBounds(..)));
    }

    #[test]
    fn test_invalid_ratio() {
        for ratio in [-1.0, f64::NAN, f64::INFINITY] {
            let e = SearchWindow::around((10, 10, 10), (30, 10, 10), (50, 50, 50), ratio, false);
            assert!(matches!(e, Err(GridError::InvalidConfig(_))), "{ratio}");
        }
    }

    /// 条带上相邻两个电极作为起点终点时, 只要这两点离体数据边界至少一个边距, 窗口就不会越界.
    #[test]
    fn test_strip_pairs_stay_inside() {
        let shape = (100, 100, 100);
        let corners = [
            ((15.0, 20.0, 25.0), (70.0, 80.0, 85.0)),
            ((75.0, 20.0, 50.0), (20.0, 75.0, 50.0)),
            ((50.0, 50.0, 15.0), (50.0, 50.0, 85.0)),
        ];
        let far_enough = |v: (usize, usize, usize), m: usize| {
            v.0 >= m && v.1 >= m && v.2 >= m
                && v.0 + m < shape.0 && v.1 + m < shape.1 && v.2 + m < shape.2
        };
        for (a, b) in corners {
            let strips = [
                strip_with_step(a, b, 10.0),
                strip_with_step(a, b, 3.5),
                strip_with_count(a, b, 8).unwrap(),
                strip_with_count(a, b, 2).unwrap(),
            ];
            for strip in strips {
                let voxels = strip.rounded(shape).unwrap();
                for pair in voxels.windows(2) {
                    let d = distance(to_f64(pair[0]), to_f64(pair[1]));
                    let m = ((WINDOW_MARGIN_RATIO * d).ceil() as usize).max(FIXED_AXIS_MARGIN);
                    assert!(far_enough(pair[0], m) && far_enough(pair[1], m));

                    let w = SearchWindow::around(pair[0], pair[1], shape, WINDOW_MARGIN_RATIO, false);
                    assert!(w.is_ok(), "{:?} -> {:?}: {w:?}", pair[0], pair[1]);
                }
            }
        }
    }

    #[test]
    fn test_flat_window() {
        let w = SearchWindow::around((3, 3, 0), (8, 3, 0), (20, 20, 1), 0.1, true).unwrap();
        assert_eq!(w.shape(), (8, 3, 1));
        // 单层窗口内部点有 8 个邻居.
        assert_eq!(w.neighbours((3, 1, 0)).count(), 8);
        assert_eq!(w.neighbours((0, 0, 0)).count(), 3);
    }

    #[test]
    fn test_neighbours_clipped() {
        let w = SearchWindow::around((5, 5, 5), (5, 5, 5), (20, 20, 20), 0.1, false).unwrap();
        assert_eq!(w.shape(), (3, 3, 3));
        assert_eq!(w.neighbours((1, 1, 1)).count(), 26);
        assert_eq!(w.neighbours((0, 0, 0)).count(), 7);
        assert_eq!(w.neighbours((0, 1, 1)).count(), 17);
        assert_eq!(w.neighbours((0, 0, 1)).count(), 11);
    }
}
