//! SyncBlueprint - Config Loader 输出
//!
//! 描述一次同步运行的完整配置：测试目录、输入文件、时钟校正、输出路由。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{AdcCalibration, ClockConfig, SyncEngineConfig, TrailingEdgePolicy, TriggerSource};

/// 原始数据子目录
pub const RAW_DATA_DIR: &str = "Raw_Data";

/// 同步结果子目录
pub const SYNCED_DATA_DIR: &str = "Synced_Data";

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的同步配置蓝图
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 测试标识与目录
    #[serde(default)]
    pub test: TestConfig,

    /// 显式输入路径 (缺省时自动发现)
    #[serde(default)]
    pub inputs: InputsConfig,

    /// 试验机数据流 (Input A)
    #[serde(default)]
    pub machine: MachineConfig,

    /// 触发控制器日志 (Input B)
    #[serde(default)]
    pub device: DeviceConfig,

    /// 相机帧列表 (Input C)
    #[serde(default)]
    pub camera: CameraConfig,

    /// 时钟校正
    #[serde(default)]
    pub clock: ClockConfig,

    /// 输出
    #[serde(default)]
    pub output: OutputConfig,
}

/// 测试配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestConfig {
    /// 测试 ID (缺省取测试目录名)
    #[serde(default)]
    pub id: Option<String>,

    /// 测试目录，包含 Raw_Data/ 与 Synced_Data/
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// 输入文件路径
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputsConfig {
    #[serde(default)]
    pub machine: Option<PathBuf>,

    #[serde(default)]
    pub device: Option<PathBuf>,

    #[serde(default)]
    pub cameras: Vec<CameraInput>,
}

/// 单个相机的帧列表文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraInput {
    pub name: String,
    pub path: PathBuf,
}

/// 试验机数据流格式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineConfig {
    /// 分隔符 (单字符)
    #[serde(default = "default_tab")]
    pub delimiter: String,

    /// 触发通道名 (原始名或 `name [unit]`)
    #[serde(default = "default_trigger_channel")]
    pub trigger_channel: String,

    /// 末尾伪边沿策略
    #[serde(default)]
    pub trailing_edge: TrailingEdgePolicy,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            delimiter: default_tab(),
            trigger_channel: default_trigger_channel(),
            trailing_edge: TrailingEdgePolicy::default(),
        }
    }
}

/// 触发控制器日志格式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_comma")]
    pub delimiter: String,

    /// 首行是否为表头
    #[serde(default = "default_true")]
    pub has_header: bool,

    /// 与触发边沿配对的设备时间来源
    #[serde(default)]
    pub trigger_source: TriggerSource,

    /// 四路 ADC 标定
    #[serde(default = "AdcCalibration::defaults")]
    pub adc: Vec<AdcCalibration>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            delimiter: default_comma(),
            has_header: true,
            trigger_source: TriggerSource::default(),
            adc: AdcCalibration::defaults(),
        }
    }
}

/// 相机帧列表格式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_tab")]
    pub delimiter: String,

    /// 文件名列
    #[serde(default = "default_filename_column")]
    pub filename_column: String,

    /// 帧号列 (缺省按行号)
    #[serde(default = "default_index_column")]
    pub index_column: Option<String>,

    /// 主相机 (决定导出行序)，缺省取第一个
    #[serde(default)]
    pub primary: Option<String>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            delimiter: default_tab(),
            filename_column: default_filename_column(),
            index_column: default_index_column(),
            primary: None,
        }
    }
}

/// 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// 输出目录 (缺省为 `<test.dir>/Synced_Data`)
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// 完整轨迹分隔符
    #[serde(default = "default_comma")]
    pub trace_delimiter: String,

    /// 导出的试验机通道 (空 = 全部非触发通道)
    #[serde(default)]
    pub export_channels: Vec<String>,

    /// 导出是否包含设备列
    #[serde(default = "default_true")]
    pub include_device_columns: bool,

    /// 小数位上限
    #[serde(default = "default_decimals")]
    pub decimals: usize,

    /// 输出 sink 列表
    #[serde(default = "default_sinks")]
    pub sinks: Vec<SinkConfig>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            trace_delimiter: default_comma(),
            export_channels: Vec::new(),
            include_device_columns: true,
            decimals: default_decimals(),
            sinks: default_sinks(),
        }
    }
}

/// Sink 输出配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink 名称
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 日志输出
    Log,
    /// 文件输出 (原子提交)
    File,
}

fn default_tab() -> String {
    "\t".to_string()
}

fn default_comma() -> String {
    ",".to_string()
}

fn default_true() -> bool {
    true
}

fn default_trigger_channel() -> String {
    "DIC.trigger".to_string()
}

fn default_filename_column() -> String {
    "Frame_Name".to_string()
}

fn default_index_column() -> Option<String> {
    Some("Frame".to_string())
}

fn default_decimals() -> usize {
    9
}

fn default_sinks() -> Vec<SinkConfig> {
    vec![
        SinkConfig {
            name: "files".to_string(),
            sink_type: SinkType::File,
        },
        SinkConfig {
            name: "summary".to_string(),
            sink_type: SinkType::Log,
        },
    ]
}

/// Single-character delimiter; `\t` escapes are accepted
pub fn delimiter_char(raw: &str) -> Option<char> {
    if raw == "\\t" {
        return Some('\t');
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

impl SyncBlueprint {
    /// Build a SyncEngineConfig from the blueprint
    pub fn to_sync_engine_config(&self) -> SyncEngineConfig {
        SyncEngineConfig {
            trailing_edge: self.machine.trailing_edge,
            trigger_source: self.device.trigger_source,
            clock: self.clock.clone(),
        }
    }

    /// Test identifier: explicit id, else the test directory name
    pub fn test_id(&self) -> String {
        if let Some(id) = &self.test.id {
            return id.clone();
        }
        self.test
            .dir
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "test".to_string())
    }

    /// Directory scanned for inputs not configured explicitly
    pub fn raw_data_dir(&self) -> Option<PathBuf> {
        let dir = self.test.dir.as_ref()?;
        let raw = dir.join(RAW_DATA_DIR);
        Some(if raw.is_dir() { raw } else { dir.clone() })
    }

    /// Directory the artifacts are written to
    pub fn output_dir(&self) -> PathBuf {
        match (&self.output.dir, &self.test.dir) {
            (Some(out), Some(test_dir)) if out.is_relative() => test_dir.join(out),
            (Some(out), _) => out.clone(),
            (None, Some(test_dir)) => test_dir.join(SYNCED_DATA_DIR),
            (None, None) => PathBuf::from(SYNCED_DATA_DIR),
        }
    }

    /// Resolve a configured input path against the test directory
    pub fn resolve_input(&self, path: &Path) -> PathBuf {
        match &self.test.dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}
