//! 取点会话.
//!
//! 交互界面 (不在本 crate 内) 每次点击投影图像时, 由外部提供的 [`VoxelMapper`]
//! 把图像坐标映射为体素坐标. 已经点过的角点保存在显式的 [`PickSession`] 中,
//! 而不是全局变量里; 点够角点后以 [`PickSession::finish`] 取出 [`Corners`].

use crate::interpol::Corners;
use crate::{GridError, GridResult, Idx2dF, Idx3d, Idx3dF};
use log::debug;
use num::ToPrimitive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 投影图像的观察角度 (单位: 度).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ViewAngles {
    /// 绕第三轴的旋转角.
    pub theta: f64,

    /// 绕第二轴的旋转角.
    pub phi: f64,
}

/// 图像坐标 -> 体素坐标. 由外部可视化层实现.
pub trait VoxelMapper {
    /// 以 `angles` 观察时, 图像上的点 `point` 对应的体素坐标 (未取整).
    fn image_point_to_voxel(&self, point: Idx2dF, angles: ViewAngles) -> Idx3dF;

    /// 被映射的体数据形状.
    fn shape(&self) -> Idx3d;

    /// 映射并取整到最近的体素.
    #[inline]
    fn pick(&self, point: Idx2dF, angles: ViewAngles) -> GridResult<Idx3d> {
        round_voxel(self.image_point_to_voxel(point, angles), self.shape())
    }
}

/// 舍入到最近的整数, 恰好在两个整数中间时取偶数 (与 numpy 的 `round` 一致).
#[inline]
fn round_half_even(x: f64) -> f64 {
    let r = x.round();
    if (x - x.trunc()).abs() == 0.5 {
        2.0 * (x / 2.0).round()
    } else {
        r
    }
}

/// 将实数坐标舍入到最近的体素, `.5` 时取偶数, 即 `2.5 -> 2`, `3.5 -> 4`.
/// 结果不在 `shape` 内时返回 `GridError::OutOfBounds`.
pub fn round_voxel(p: Idx3dF, shape: Idx3d) -> GridResult<Idx3d> {
    let err = || GridError::point_out_of_bounds(p, shape);
    let i = round_half_even(p.0).to_usize().ok_or_else(err)?;
    let j = round_half_even(p.1).to_usize().ok_or_else(err)?;
    let k = round_half_even(p.2).to_usize().ok_or_else(err)?;
    if i >= shape.0 || j >= shape.1 || k >= shape.2 {
        return Err(err());
    }
    Ok((i, j, k))
}

/// 本次取点的目标.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PickTarget {
    /// 条带, 2 个角点.
    Strip,

    /// 网格, 3 个角点.
    Grid,

    /// 混合网格, 4 个角点.
    Hybrid,
}

impl PickTarget {
    /// 所需角点个数.
    #[inline]
    pub const fn corner_count(self) -> usize {
        match self {
            Self::Strip => 2,
            Self::Grid => 3,
            Self::Hybrid => 4,
        }
    }
}

/// 一次取点会话.
#[derive(Debug, Clone, PartialEq)]
pub struct PickSession {
    target: PickTarget,
    picked: Vec<Idx3d>,
}

impl PickSession {
    /// 开始一次新的会话.
    pub fn new(target: PickTarget) -> Self {
        Self {
            target,
            picked: Vec::with_capacity(target.corner_count()),
        }
    }

    /// 目标.
    #[inline]
    pub fn target(&self) -> PickTarget {
        self.target
    }

    /// 已经取到的角点, 按点击顺序.
    #[inline]
    pub fn picked(&self) -> &[Idx3d] {
        &self.picked
    }

    /// 还需要几个角点.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.target.corner_count() - self.picked.len()
    }

    /// 角点是否已经取够.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    /// 加入一个角点, 返回还需要的角点个数.
    ///
    /// 角点已经取够时返回 `GridError::InvalidCorners`, 会话不变.
    pub fn push(&mut self, voxel: Idx3d) -> GridResult<usize> {
        if self.is_complete() {
            return Err(GridError::InvalidCorners(format!(
                "{:?} session already has {} corners",
                self.target,
                self.picked.len()
            )));
        }
        self.picked.push(voxel);
        debug!("picked corner {} at {voxel:?}", self.picked.len());
        Ok(self.remaining())
    }

    /// 通过 `mapper` 把一次点击转换为角点并加入.
    pub fn click<M: VoxelMapper + ?Sized>(
        &mut self,
        mapper: &M,
        point: Idx2dF,
        angles: ViewAngles,
    ) -> GridResult<usize> {
        let voxel = mapper.pick(point, angles)?;
        self.push(voxel)
    }

    /// 取出角点. 角点个数不足时返回 `GridError::InvalidCorners`.
    pub fn finish(&self) -> GridResult<Corners> {
        if !self.is_complete() {
            return Err(GridError::InvalidCorners(format!(
                "{:?} needs {} corners, got {}",
                self.target,
                self.target.corner_count(),
                self.picked.len()
            )));
        }
        Corners::from_voxels(&self.picked)
    }

    /// 清空已取的角点, 目标不变.
    #[inline]
    pub fn reset(&mut self) {
        self.picked.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{round_voxel, PickSession, PickTarget, ViewAngles, VoxelMapper};
    use crate::interpol::Corners;
    use crate::{GridError, Idx2dF, Idx3d, Idx3dF};

    /// 正视投影: 图像点 `(x, y)` 映射到第 `depth` 层.
    struct FrontView {
        depth: f64,
        shape: Idx3d,
    }

    impl VoxelMapper for FrontView {
        fn image_point_to_voxel(&self, (x, y): Idx2dF, _: ViewAngles) -> Idx3dF {
            (y, x, self.depth)
        }

        fn shape(&self) -> Idx3d {
            self.shape
        }
    }

    #[test]
    fn test_round_voxel() {
        assert_eq!(round_voxel((1.4, 2.5, 0.0), (5, 5, 5)), Ok((1, 2, 0)));
        assert_eq!(round_voxel((3.5, 0.5, 1.5), (5, 5, 5)), Ok((4, 0, 2)));
        assert_eq!(round_voxel((4.49, 0.0, 0.0), (5, 5, 5)), Ok((4, 0, 0)));
        assert_eq!(round_voxel((4.5, 0.0, 0.0), (5, 5, 5)), Ok((4, 0, 0)));
        assert_eq!(round_voxel((-0.5, 0.0, 0.0), (5, 5, 5)), Ok((0, 0, 0)));
        assert!(matches!(
            round_voxel((4.51, 0.0, 0.0), (5, 5, 5)),
            Err(GridError::OutOfBounds(..))
        ));
        assert!(matches!(
            round_voxel((-0.6, 0.0, 0.0), (5, 5, 5)),
            Err(GridError::OutOfBounds(..))
        ));
        assert!(round_voxel((f64::NAN, 0.0, 0.0), (5, 5, 5)).is_err());
    }

    #[test]
    fn test_session_flow() {
        let mut s = PickSession::new(PickTarget::Grid);
        assert_eq!(s.remaining(), 3);
        assert_eq!(s.push((1, 1, 1)), Ok(2));
        assert!(matches!(s.finish(), Err(GridError::InvalidCorners(_))));
        assert_eq!(s.push((1, 9, 1)), Ok(1));
        assert_eq!(s.push((9, 1, 1)), Ok(0));
        assert!(s.is_complete());

        // 多余的点击被拒绝.
        assert!(s.push((5, 5, 5)).is_err());
        assert_eq!(s.picked().len(), 3);

        assert_eq!(
            s.finish(),
            Ok(Corners::Triangle(
                (1.0, 1.0, 1.0),
                (1.0, 9.0, 1.0),
                (9.0, 1.0, 1.0)
            ))
        );

        s.reset();
        assert_eq!(s.remaining(), 3);
        assert_eq!(s.target(), PickTarget::Grid);
    }

    #[test]
    fn test_session_click() {
        let mapper = FrontView {
            depth: 7.2,
            shape: (20, 20, 20),
        };
        let mut s = PickSession::new(PickTarget::Strip);
        let angles = ViewAngles::default();
        assert_eq!(s.click(&mapper, (3.6, 10.1), angles), Ok(1));
        assert_eq!(s.picked(), &[(10, 4, 7)]);

        // 越界的点击不改变会话.
        assert!(s.click(&mapper, (25.0, 1.0), angles).is_err());
        assert_eq!(s.remaining(), 1);

        assert_eq!(s.click(&mapper, (12.0, 10.0), angles), Ok(0));
        assert!(matches!(s.finish(), Ok(Corners::Strip(..))));
    }
}
