//! # Dispatcher
//!
//! 输出组装与分发模块。
//!
//! 负责：
//! - 将同步结果渲染为完整轨迹、帧导出与触发时间差诊断文件
//! - Fan-out 到多个 sinks
//! - 全部写入成功后才提交，失败时不留下部分输出

pub mod assembler;
pub mod dispatcher;
pub mod error;
pub mod format;
pub mod sinks;

pub use assembler::{AssemblerConfig, EXPORT_DELIMITER, OutputAssembler};
pub use contracts::{Artifact, ArtifactKind, ArtifactSink};
pub use dispatcher::{DispatchReport, Dispatcher};
pub use error::DispatcherError;
pub use format::{format_counter, format_number};
pub use sinks::{FileSink, FileSinkConfig, LogSink};
