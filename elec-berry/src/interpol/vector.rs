//! `Idx3dF` 上的向量运算.

use crate::{Idx3d, Idx3dF};

/// `a + b`.
#[inline]
pub(crate) fn add((a, b, c): Idx3dF, (x, y, z): Idx3dF) -> Idx3dF {
    (a + x, b + y, c + z)
}

/// `a - b`.
#[inline]
pub(crate) fn sub((a, b, c): Idx3dF, (x, y, z): Idx3dF) -> Idx3dF {
    (a - x, b - y, c - z)
}

/// `k * v`.
#[inline]
pub(crate) fn scale((a, b, c): Idx3dF, k: f64) -> Idx3dF {
    (a * k, b * k, c * k)
}

/// 向量长度.
#[inline]
pub(crate) fn norm((a, b, c): Idx3dF) -> f64 {
    (a * a + b * b + c * c).sqrt()
}

/// 两点欧几里得距离.
#[inline]
pub(crate) fn distance(p: Idx3dF, q: Idx3dF) -> f64 {
    norm(sub(p, q))
}

/// 叉积.
#[inline]
pub(crate) fn cross((a, b, c): Idx3dF, (x, y, z): Idx3dF) -> Idx3dF {
    (b * z - c * y, c * x - a * z, a * y - b * x)
}

/// 线性插值 `p + t * (q - p)`.
#[inline]
pub(crate) fn lerp(p: Idx3dF, q: Idx3dF, t: f64) -> Idx3dF {
    add(p, scale(sub(q, p), t))
}

/// 整数坐标 -> 实数坐标.
#[inline]
pub(crate) fn to_f64((i, j, k): Idx3d) -> Idx3dF {
    (i as f64, j as f64, k as f64)
}

/// 三点是否退化 (有两点重合或三点共线). `tol` 为相对容差.
pub(crate) fn is_degenerate(a: Idx3dF, b: Idx3dF, c: Idx3dF, tol: f64) -> bool {
    let (ab, ac) = (sub(b, a), sub(c, a));
    let (lb, lc) = (norm(ab), norm(ac));
    if lb <= tol || lc <= tol || distance(b, c) <= tol {
        return true;
    }
    // |ab x ac| = |ab| |ac| sin(theta)
    norm(cross(ab, ac)) <= tol * lb * lc
}
