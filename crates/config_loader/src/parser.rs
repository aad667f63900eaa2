//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, SyncBlueprint};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<SyncBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<SyncBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<SyncBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AlignmentMode, TriggerSource};

    #[test]
    fn test_parse_toml_empty_uses_defaults() {
        let bp = parse_toml("").unwrap();
        assert_eq!(bp.machine.trigger_channel, "DIC.trigger");
        assert_eq!(bp.clock.offset_constant_ms, 15.0);
        assert_eq!(bp.device.adc.len(), 4);
    }

    #[test]
    fn test_parse_toml_sections() {
        let content = r#"
[test]
id = "T7"

[device]
trigger_source = "stage_change_time"

[[device.adc]]
name = "ADC_Force [kN]"
gain = 20.0

[clock]
offset_constant_ms = 12.5
mode = "best_effort"
"#;
        let bp = parse_toml(content).unwrap();
        assert_eq!(bp.test.id.as_deref(), Some("T7"));
        assert_eq!(bp.device.trigger_source, TriggerSource::StageChangeTime);
        assert_eq!(bp.device.adc.len(), 1);
        assert_eq!(bp.device.adc[0].offset, 0.0);
        assert_eq!(bp.clock.mode, AlignmentMode::BestEffort);
        assert_eq!(bp.clock.drift_threshold_ms, 100.0);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "test": { "id": "T1", "dir": "/tmp/T1" },
            "inputs": { "cameras": [{ "name": "0", "path": "cam0.txt" }] },
            "output": { "decimals": 6 }
        }"#;
        let bp = parse_json(content).unwrap();
        assert_eq!(bp.inputs.cameras.len(), 1);
        assert_eq!(bp.output.decimals, 6);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let result = parse_toml("invalid toml [[[");
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }

    #[test]
    fn test_parse_rejects_unknown_enum_value() {
        let result = parse_toml("[clock]\nmode = \"lenient\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
