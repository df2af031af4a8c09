//! 角点插值.
//!
//! 根据 2~4 个已知的电极角点, 生成整条条带 (strip) 或整块网格 (grid) 上所有电极的坐标.
//!
//! - 2 个角点 `A, B`: 条带, 从 `A` 走向 `B`;
//! - 3 个角点: 两两距离最长的一对视为对角线, 剩下的那个角点为原点 `A`,
//!   另两个角点按输入顺序分别为 `B` (第一行的末端) 与 `C` (最后一行的首端), 网格为平行四边形;
//! - 4 个角点 `A, B, C, D`: `D` 与 `A` 相对, 网格由双线性插值得到.
//!
//! 输出的网格点按行优先排列, 第 `i` 行第 `j` 列的点位于
//! `bilinear(A, B, C, D; t = i / (m - 1), s = j / (n - 1))`.

mod vector;

pub(crate) use vector::{distance, lerp, to_f64};

use crate::consts::EPS;
use crate::session::round_voxel;
use crate::{GridError, GridResult, Idx3d, Idx3dF};
use either::Either;
use log::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 用户给出的角点.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Corners {
    /// 条带的两端.
    Strip(Idx3dF, Idx3dF),

    /// 网格的三个角, 顺序任意.
    Triangle(Idx3dF, Idx3dF, Idx3dF),

    /// 网格的四个角 `A, B, C, D`, `D` 与 `A` 相对.
    Quad(Idx3dF, Idx3dF, Idx3dF, Idx3dF),
}

impl Corners {
    /// 从 2~4 个角点构建. 其他个数返回 `GridError::InvalidCorners`.
    pub fn from_slice(corners: &[Idx3dF]) -> GridResult<Self> {
        match *corners {
            [a, b] => Ok(Self::Strip(a, b)),
            [a, b, c] => Ok(Self::Triangle(a, b, c)),
            [a, b, c, d] => Ok(Self::Quad(a, b, c, d)),
            _ => Err(GridError::InvalidCorners(format!(
                "expected 2 to 4 corners, got {}",
                corners.len()
            ))),
        }
    }

    /// 从整数体素坐标构建.
    pub fn from_voxels(corners: &[Idx3d]) -> GridResult<Self> {
        let corners: Vec<_> = corners.iter().map(|p| to_f64(*p)).collect();
        Self::from_slice(&corners)
    }

    /// 角点个数.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::Strip(..) => 2,
            Self::Triangle(..) => 3,
            Self::Quad(..) => 4,
        }
    }

    /// 永远为 `false`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// 全部角点, 按输入顺序.
    pub fn to_vec(&self) -> Vec<Idx3dF> {
        match *self {
            Self::Strip(a, b) => vec![a, b],
            Self::Triangle(a, b, c) => vec![a, b, c],
            Self::Quad(a, b, c, d) => vec![a, b, c, d],
        }
    }

    /// 网格的四个角. 条带没有网格框架.
    fn frame(&self) -> GridResult<Frame> {
        match *self {
            Self::Strip(..) => Err(GridError::InvalidCorners(
                "2 corners describe a strip, not a grid".to_string(),
            )),
            Self::Triangle(p0, p1, p2) => Frame::from_triangle(p0, p1, p2),
            Self::Quad(a, b, c, d) => Frame::from_quad(a, b, c, d),
        }
    }
}

/// 网格的四个角. 第一行从 `a` 到 `b`, 最后一行从 `c` 到 `d`.
#[derive(Debug, Clone, Copy)]
struct Frame {
    a: Idx3dF,
    b: Idx3dF,
    c: Idx3dF,
    d: Idx3dF,
}

impl Frame {
    fn from_triangle(p0: Idx3dF, p1: Idx3dF, p2: Idx3dF) -> GridResult<Self> {
        if vector::is_degenerate(p0, p1, p2, EPS) {
            return Err(GridError::InvalidCorners(format!(
                "corners {p0:?}, {p1:?}, {p2:?} are coincident or collinear"
            )));
        }
        let (d01, d02, d12) = (distance(p0, p1), distance(p0, p2), distance(p1, p2));
        // 最长边为对角线, 不在对角线上的角点为原点.
        let (a, b, c) = if d12 >= d01 && d12 >= d02 {
            (p0, p1, p2)
        } else if d02 >= d01 {
            (p1, p0, p2)
        } else {
            (p2, p0, p1)
        };
        let d = vector::sub(vector::add(b, c), a);
        Ok(Self { a, b, c, d })
    }

    fn from_quad(a: Idx3dF, b: Idx3dF, c: Idx3dF, d: Idx3dF) -> GridResult<Self> {
        if vector::is_degenerate(a, b, c, EPS)
            || vector::is_degenerate(d, c, b, EPS)
            || distance(a, d) <= EPS
        {
            return Err(GridError::InvalidCorners(format!(
                "corners {a:?}, {b:?}, {c:?}, {d:?} do not span a quadrilateral"
            )));
        }
        Ok(Self { a, b, c, d })
    }

    /// 行方向参数 `t`, 列方向参数 `s`.
    #[inline]
    fn at(&self, t: f64, s: f64) -> Idx3dF {
        lerp(lerp(self.a, self.b, s), lerp(self.c, self.d, s), t)
    }

    /// 列方向 (第一行) 长度.
    #[inline]
    fn row_length(&self) -> f64 {
        distance(self.a, self.b)
    }

    /// 行方向 (第一列) 长度.
    #[inline]
    fn col_length(&self) -> f64 {
        distance(self.a, self.c)
    }
}

/// 固定行数/列数.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FixedCount {
    rows: usize,
    cols: usize,
}

/// 固定步长 (单位: 体素).
#[derive(Debug, Clone, Copy, PartialEq)]
struct FixedStep {
    step: f64,
}

/// 插值规则.
///
/// 固定个数是主要模式, 电极网格的行列数由其物理规格确定;
/// 固定步长是辅助模式, 只在不知道行列数时使用.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    manner: Either<FixedCount, FixedStep>,
}

impl GridSpec {
    /// `rows` 行 `cols` 列. 有一维为 1 时退化为条带.
    #[inline]
    pub fn with_count(rows: usize, cols: usize) -> Self {
        Self {
            manner: Either::Left(FixedCount { rows, cols }),
        }
    }

    /// `num` 个点的条带.
    #[inline]
    pub fn strip(num: usize) -> Self {
        Self::with_count(1, num)
    }

    /// 相邻电极间距为 `step`. `step` 必须为正且有限, 否则程序 panic.
    #[inline]
    pub fn with_step(step: f64) -> Self {
        assert!(step.is_finite() && step > 0.0);
        Self {
            manner: Either::Right(FixedStep { step }),
        }
    }

    /// 固定个数模式下的 `(rows, cols)`.
    #[inline]
    pub fn count(&self) -> Option<(usize, usize)> {
        self.manner
            .as_ref()
            .left()
            .map(|FixedCount { rows, cols }| (*rows, *cols))
    }

    /// 固定步长模式下的步长.
    #[inline]
    pub fn step(&self) -> Option<f64> {
        self.manner.as_ref().right().map(|s| s.step)
    }
}

/// 网格类别, 决定电极的命名.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GridKind {
    /// 一维条带.
    Strip,

    /// 二维网格.
    Grid,
}

impl GridKind {
    /// 电极名称前缀.
    #[inline]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Strip => "STRIP",
            Self::Grid => "GRID",
        }
    }
}

/// 一条条带或一块网格上所有电极的坐标, 按行优先排列.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElectrodeGrid {
    kind: GridKind,
    rows: usize,
    cols: usize,
    points: Vec<Idx3dF>,
}

impl ElectrodeGrid {
    pub(crate) fn new(kind: GridKind, rows: usize, cols: usize, points: Vec<Idx3dF>) -> Self {
        debug_assert_eq!(rows * cols, points.len());
        Self {
            kind,
            rows,
            cols,
            points,
        }
    }

    fn strip(points: Vec<Idx3dF>) -> Self {
        Self::new(GridKind::Strip, 1, points.len(), points)
    }

    /// 网格类别.
    #[inline]
    pub fn kind(&self) -> GridKind {
        self.kind
    }

    /// `(rows, cols)`. 条带为 `(1, n)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// 电极个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否没有电极.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 全部坐标, 行优先.
    #[inline]
    pub fn points(&self) -> &[Idx3dF] {
        &self.points
    }

    /// 第 `i` 行.
    #[inline]
    pub fn row(&self, i: usize) -> &[Idx3dF] {
        &self.points[i * self.cols..(i + 1) * self.cols]
    }

    /// 第 `i` 行第 `j` 列的电极.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<Idx3dF> {
        (i < self.rows && j < self.cols).then(|| self.points[i * self.cols + j])
    }

    /// 第 `idx` 个电极 (0 起) 的名称, 如 `"GRID 1"`. 名称从 1 开始计数.
    #[inline]
    pub fn label(&self, idx: usize) -> String {
        format!("{} {}", self.kind.prefix(), idx + 1)
    }

    /// `(名称, 坐标)` 迭代器.
    pub fn named(&self) -> impl Iterator<Item = (String, Idx3dF)> + '_ {
        self.points
            .iter()
            .enumerate()
            .map(|(idx, p)| (self.label(idx), *p))
    }

    /// 将所有坐标取整到形状为 `shape` 的体数据中最近的体素.
    pub fn rounded(&self, shape: Idx3d) -> GridResult<Vec<Idx3d>> {
        self.points.iter().map(|p| round_voxel(*p, shape)).collect()
    }

    /// 直接获得内部数据的所有权.
    #[inline]
    pub fn into_points(self) -> Vec<Idx3dF> {
        self.points
    }
}

/// `[0, len]` 上以 `step` 为间距的参数, 归一化到 `[0, 1]`. 末端不足一步的部分被舍弃.
fn step_fractions(len: f64, step: f64) -> Vec<f64> {
    if len <= EPS {
        return vec![0.0];
    }
    let count = (len / step + EPS).floor() as usize + 1;
    (0..count).map(|k| k as f64 * step / len).collect()
}

/// `num` 个均匀分布于 `[0, 1]` 的参数, 两端均包含. `num >= 2`.
fn count_fractions(num: usize) -> Vec<f64> {
    debug_assert!(num >= 2);
    let last = (num - 1) as f64;
    (0..num).map(|k| k as f64 / last).collect()
}

/// 从 `a` 出发沿 `b - a` 方向每隔 `step` 放一个电极, 不超过 `b`.
///
/// `a` 与 `b` 重合时只有一个电极.
pub fn strip_with_step(a: Idx3dF, b: Idx3dF, step: f64) -> ElectrodeGrid {
    assert!(step.is_finite() && step > 0.0);
    let fractions = step_fractions(distance(a, b), step);
    if fractions.len() == 1 {
        warn!("strip {a:?} -> {b:?} with step {step} has a single electrode");
    }
    ElectrodeGrid::strip(fractions.into_iter().map(|t| lerp(a, b, t)).collect())
}

/// 从 `a` 到 `b` (均包含) 均匀放置 `num` 个电极.
///
/// `num == 0` 时返回 `GridError::DegenerateGrid`; `num == 1` 时只有 `a`.
pub fn strip_with_count(a: Idx3dF, b: Idx3dF, num: usize) -> GridResult<ElectrodeGrid> {
    match num {
        0 => Err(GridError::DegenerateGrid(1, 0)),
        1 => {
            warn!("strip {a:?} -> {b:?} has a single electrode");
            Ok(ElectrodeGrid::strip(vec![a]))
        }
        _ => Ok(ElectrodeGrid::strip(
            count_fractions(num)
                .into_iter()
                .map(|t| lerp(a, b, t))
                .collect(),
        )),
    }
}

/// 按行参数 `ts` 与列参数 `ss` 在 `frame` 上取点.
fn grid_from_fractions(frame: &Frame, ts: &[f64], ss: &[f64]) -> GridResult<ElectrodeGrid> {
    let (rows, cols) = (ts.len(), ss.len());
    let kind = match (rows, cols) {
        (0, _) | (_, 0) | (1, 1) => return Err(GridError::DegenerateGrid(rows, cols)),
        (1, _) | (_, 1) => GridKind::Strip,
        _ => GridKind::Grid,
    };
    let mut points = Vec::with_capacity(rows * cols);
    for &t in ts {
        for &s in ss {
            points.push(frame.at(t, s));
        }
    }
    // 退化为条带时统一为 1 行.
    let (rows, cols) = match kind {
        GridKind::Strip => (1, points.len()),
        GridKind::Grid => (rows, cols),
    };
    Ok(ElectrodeGrid::new(kind, rows, cols, points))
}

/// 根据角点与插值规则生成电极坐标.
///
/// # 错误
///
/// - 角点重合 / 共线, 或 2 个角点要求生成多行多列的网格时返回 `GridError::InvalidCorners`;
/// - 行数或列数为 0, 或网格只有一个电极时返回 `GridError::DegenerateGrid`.
///
/// 行数或列数为 1 的网格退化为条带: `1 x n` 沿 `A -> B`, `m x 1` 沿 `A -> C`.
pub fn interpolate(corners: &Corners, spec: &GridSpec) -> GridResult<ElectrodeGrid> {
    let grid = match (*corners, spec.manner) {
        (Corners::Strip(a, b), Either::Left(FixedCount { rows, cols })) => {
            if rows == 0 || cols == 0 {
                return Err(GridError::DegenerateGrid(rows, cols));
            }
            if rows > 1 && cols > 1 {
                return Err(GridError::InvalidCorners(format!(
                    "2 corners cannot span a {rows} x {cols} grid"
                )));
            }
            strip_with_count(a, b, rows * cols)?
        }
        (Corners::Strip(a, b), Either::Right(FixedStep { step })) => strip_with_step(a, b, step),
        (_, Either::Left(FixedCount { rows, cols })) => {
            if rows == 0 || cols == 0 || rows * cols == 1 {
                return Err(GridError::DegenerateGrid(rows, cols));
            }
            let frame = corners.frame()?;
            match (rows, cols) {
                (1, n) => strip_with_count(frame.a, frame.b, n)?,
                (m, 1) => strip_with_count(frame.a, frame.c, m)?,
                (m, n) => grid_from_fractions(&frame, &count_fractions(m), &count_fractions(n))?,
            }
        }
        (_, Either::Right(FixedStep { step })) => {
            let frame = corners.frame()?;
            let ts = step_fractions(frame.col_length(), step);
            let ss = step_fractions(frame.row_length(), step);
            grid_from_fractions(&frame, &ts, &ss)?
        }
    };
    debug!(
        "interpolated {:?} of shape {:?} from {} corners",
        grid.kind(),
        grid.shape(),
        corners.len()
    );
    Ok(grid)
}
