//! # Sync Engine
//!
//! 触发时基对齐与帧对齐引擎。
//!
//! 负责：
//! - 从试验机触发通道提取上升沿
//! - 配对触发沿与设备触发记录，求解设备时钟 → 试验机时钟映射
//! - 双指针合并试验机数据流与帧事件，为每帧插值通道值
//! - 输出 `SyncOutcome`
//!
//! ## 使用示例
//!
//! ```ignore
//! use sync_engine::{SyncEngine, SyncEngineConfig};
//!
//! let engine = SyncEngine::new(blueprint.to_sync_engine_config());
//! let outcome = engine.run(&inputs.machine, &inputs.device)?;
//! println!("offset = {} ms", outcome.alignment.offset_ms);
//! ```

mod clock;
mod edges;
mod engine;
mod frames;

pub use clock::{fit_line, ClockAligner};
pub use edges::TriggerEdgeExtractor;
pub use engine::SyncEngine;
pub use frames::{frame_events, interpolation_ratio, FrameAligner};

// Re-export contracts types
pub use contracts::{
    AlignedTrace, ClockAlignment, ClockConfig, SyncEngineConfig, SyncOutcome, TriggerEdge,
};
