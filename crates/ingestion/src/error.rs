//! Ingestion 错误类型

use std::path::PathBuf;

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 输入文件未配置且未能发现
    #[error("{artifact} not found: {}", path.display())]
    InputMissing {
        /// 输入类型 (machine stream / device log / camera list)
        artifact: &'static str,
        /// 期望位置
        path: PathBuf,
    },

    /// 输入文件读取失败
    #[error("cannot read {artifact} {}: {source}", path.display())]
    InputRead {
        artifact: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 输入内容解析失败
    #[error("{artifact} {}:{line}: {message}", path.display())]
    InputParse {
        artifact: &'static str,
        path: PathBuf,
        /// 1-based 行号
        line: usize,
        message: String,
    },

    /// Raw_Data 目录扫描失败
    #[error("input discovery in {}: {message}", dir.display())]
    Discovery { dir: PathBuf, message: String },
}

impl IngestionError {
    pub(crate) fn parse(
        artifact: &'static str,
        path: &std::path::Path,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::InputParse {
            artifact,
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
