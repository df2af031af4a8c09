//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx2dF, Idx3d, Idx3dF};

pub use crate::{GridError, GridResult, ReconConfig};

pub use crate::geodesic::{CostClass, CostTable, PathSolver, SurfacePath};

pub use crate::interpol::{interpolate, Corners, ElectrodeGrid, GridKind, GridSpec};

pub use crate::hybrid::{build_half_hybrid_grid, build_hybrid_grid};

pub use crate::snap::Snapper;

pub use crate::session::{PickSession, PickTarget, ViewAngles, VoxelMapper};

pub use crate::volume::{ElectrodeVolume, VolumeError};

pub use crate::consts::label::{BACKGROUND, MARKER, SURFACE};
