#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 根据颅骨 CT 分割体数据和用户选取的少量电极角点, 重建植入电极网格/条带的三维体素坐标.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 所有坐标均按照 `(row, column, layer)` 即数组索引顺序组织, **不是** 图像的 `(x, y)` 顺序.
//! 2. 体数据的加载、可视化与鼠标取点不属于本 crate 的核心, 仅在 `volume` 与 `session`
//!   中提供边界接口.
//! 3. 在非期望情况下 (违反前置条件), 程序会直接 panic, 而不会导致内存错误. As what Rust promises.
//!   由用户输入导致的失败一律以 [`GridError`] 返回.
//!
//! # 开发计划
//!
//! ### 表面测地路径 (加权 Dijkstra) ✅
//!
//! 在 mask 的局部搜索窗口上建立 26-邻接 (2D 为 8-邻接) 加权图,
//! 按照 "邻域内背景体素个数" 给表面体素分配代价等级, 使路径贴着表面走.
//!
//! 实现位于 `elec-berry/src/geodesic`.
//!
//! ### 角点插值 ✅
//!
//! 2 个角点 -> 条带, 3 个角点 -> 平行四边形网格, 4 个角点 -> 双线性网格.
//! 以固定个数为主要模式, 以固定步长为辅助模式.
//!
//! 实现位于 `elec-berry/src/interpol`.
//!
//! ### 混合网格 ✅
//!
//! 两条长边 ("rail") 沿表面测地路径生成并重采样, 中间的 "rung" 直线插值.
//!
//! 实现位于 `elec-berry/src/hybrid.rs`.
//!
//! ### 电极吸附 ✅
//!
//! 将插值坐标吸附到最近的真实电极分割体素上.
//!
//! 实现位于 `elec-berry/src/snap.rs`.
//!
//! ### 小功能 ✅
//!
//! 1. 显式的取点会话 `PickSession`, 替代全局可变状态. ✅
//! 2. NIfTI / npy 体数据读写与标记. ✅
//! 3. 可序列化的配置 `ReconConfig`. ✅

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 高精度二维坐标 / 向量.
pub type Idx2dF = (f64, f64);

/// 高精度三维坐标 / 向量. 插值得到的电极坐标在取整前均以此表示.
pub type Idx3dF = (f64, f64, f64);

pub mod config;
pub mod consts;
mod error;
pub mod geodesic;
pub mod hybrid;
pub mod interpol;
pub mod prelude;
pub mod session;
pub mod snap;
pub mod volume;

pub use config::ReconConfig;
pub use error::{GridError, GridResult};
pub use geodesic::{find_path_2d, find_path_3d, CostClass, CostTable, PathSolver, SurfacePath};
pub use hybrid::{build_half_hybrid_grid, build_hybrid_grid, resample_rail};
pub use interpol::{
    interpolate, strip_with_count, strip_with_step, Corners, ElectrodeGrid, GridKind, GridSpec,
};
pub use session::{round_voxel, PickSession, PickTarget, ViewAngles, VoxelMapper};
pub use snap::{mean_distance, snap, Snapper};
pub use volume::{ElectrodeVolume, VolumeError, VolumeResult};
