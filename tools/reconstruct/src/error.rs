//! 工具程序错误.

use elec_berry::{GridError, VolumeError};
use thiserror::Error;

/// 工具程序错误.
#[derive(Debug, Error)]
pub enum ToolError {
    /// 网格重建失败.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// 体数据读写失败.
    #[error(transparent)]
    Volume(#[from] VolumeError),

    /// 病例文件格式错误.
    #[error("case file: {0}")]
    Json(#[from] serde_json::Error),

    /// 读写文件失败.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// 日志初始化失败.
    #[error("logger: {0}")]
    Logger(#[from] log::SetLoggerError),

    /// 病例内容不合法. `(病例名, 原因)`.
    #[error("case `{0}`: {1}")]
    BadCase(String, String),

    /// 无法确定数据根目录.
    #[error("cannot locate the data directory: pass --data-dir or set ${0}")]
    NoDataDir(&'static str),
}

/// 工具程序结果.
pub type Result<T> = std::result::Result<T, ToolError>;
