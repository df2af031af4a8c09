//! 通用常量.

/// 单通道标签值.
pub mod label {
    /// mask 中的背景 (脑外, 或电极分割之外) 体素值.
    pub const BACKGROUND: u8 = 0;

    /// mask 中可被测地路径经过的表面体素值.
    pub const SURFACE: u8 = 1;

    /// 标记输出体中电极位置的默认体素值.
    pub const MARKER: u8 = 1;

    /// 体素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, BACKGROUND)
    }

    /// 体素是否是表面?
    #[inline]
    pub const fn is_surface(p: u8) -> bool {
        matches!(p, SURFACE)
    }

    /// 体素是否是电极触点? 电极分割中值严格大于 1 的体素才是电极.
    #[inline]
    pub const fn is_electrode(p: u8) -> bool {
        p > SURFACE
    }
}

/// 搜索窗口边距与两端点欧氏距离之比.
pub const WINDOW_MARGIN_RATIO: f64 = 0.1;

/// 起点终点在某一轴上重合时, 该轴的固定边距.
pub const FIXED_AXIS_MARGIN: usize = 1;

/// 条带固定步长模式下的默认步长 (单位: 体素).
pub const DEFAULT_STRIP_STEP: f64 = 10.0;

/// 在输出体上标记电极时, 标记立方体的默认半宽 (单位: 体素).
pub const DEFAULT_MARKER_HALF_WIDTH: usize = 2;

/// 浮点比较时使用的容差.
pub const EPS: f64 = 1e-9;
