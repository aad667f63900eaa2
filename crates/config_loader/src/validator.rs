//! 配置校验模块
//!
//! 校验规则：
//! - 分隔符为单字符
//! - 触发通道名非空
//! - ADC 标定恰好四路，名称非空且唯一
//! - 时钟参数有限，drift_threshold_ms >= 0，scale_segments >= 1
//! - decimals <= 15
//! - 相机名唯一，primary 指向已配置的相机
//! - sink 名称非空且唯一

use std::collections::HashSet;

use contracts::{delimiter_char, ContractError, SyncBlueprint, ADC_CHANNELS};

/// 最多输出的小数位
pub const MAX_DECIMALS: usize = 15;

/// 校验 SyncBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &SyncBlueprint) -> Result<(), ContractError> {
    validate_delimiters(blueprint)?;
    validate_machine(blueprint)?;
    validate_adc(blueprint)?;
    validate_clock(blueprint)?;
    validate_cameras(blueprint)?;
    validate_output(blueprint)?;
    Ok(())
}

/// 校验分隔符
fn validate_delimiters(blueprint: &SyncBlueprint) -> Result<(), ContractError> {
    let fields = [
        ("machine.delimiter", &blueprint.machine.delimiter),
        ("device.delimiter", &blueprint.device.delimiter),
        ("camera.delimiter", &blueprint.camera.delimiter),
        ("output.trace_delimiter", &blueprint.output.trace_delimiter),
    ];
    for (field, value) in fields {
        if delimiter_char(value).is_none() {
            return Err(ContractError::config_validation(
                field,
                format!("delimiter must be a single character, got {value:?}"),
            ));
        }
    }
    Ok(())
}

fn validate_machine(blueprint: &SyncBlueprint) -> Result<(), ContractError> {
    if blueprint.machine.trigger_channel.trim().is_empty() {
        return Err(ContractError::config_validation(
            "machine.trigger_channel",
            "trigger channel cannot be empty",
        ));
    }
    Ok(())
}

/// 校验 ADC 标定
fn validate_adc(blueprint: &SyncBlueprint) -> Result<(), ContractError> {
    let adc = &blueprint.device.adc;
    if adc.len() != ADC_CHANNELS {
        return Err(ContractError::config_validation(
            "device.adc",
            format!("expected {ADC_CHANNELS} ADC calibrations, got {}", adc.len()),
        ));
    }

    let mut seen = HashSet::new();
    for (idx, cal) in adc.iter().enumerate() {
        if cal.name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("device.adc[{idx}].name"),
                "ADC name cannot be empty",
            ));
        }
        if !seen.insert(cal.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("device.adc[{idx}].name"),
                format!("duplicate ADC name '{}'", cal.name),
            ));
        }
        if !cal.gain.is_finite() || !cal.offset.is_finite() {
            return Err(ContractError::config_validation(
                format!("device.adc[{idx}]"),
                "gain and offset must be finite",
            ));
        }
    }
    Ok(())
}

/// 校验时钟参数
fn validate_clock(blueprint: &SyncBlueprint) -> Result<(), ContractError> {
    let clock = &blueprint.clock;

    if !clock.offset_constant_ms.is_finite() {
        return Err(ContractError::config_validation(
            "clock.offset_constant_ms",
            format!("must be finite, got {}", clock.offset_constant_ms),
        ));
    }

    if !clock.drift_threshold_ms.is_finite() || clock.drift_threshold_ms < 0.0 {
        return Err(ContractError::config_validation(
            "clock.drift_threshold_ms",
            format!("must be finite and >= 0, got {}", clock.drift_threshold_ms),
        ));
    }

    if clock.scale_segments == 0 {
        return Err(ContractError::config_validation(
            "clock.scale_segments",
            "scale_segments must be >= 1",
        ));
    }

    Ok(())
}

/// 校验相机配置
fn validate_cameras(blueprint: &SyncBlueprint) -> Result<(), ContractError> {
    let cameras = &blueprint.inputs.cameras;

    let mut seen = HashSet::new();
    for (idx, camera) in cameras.iter().enumerate() {
        if camera.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("inputs.cameras[{idx}].name"),
                "camera name cannot be empty",
            ));
        }
        if !seen.insert(camera.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("inputs.cameras[name={}]", camera.name),
                "duplicate camera name",
            ));
        }
    }

    if blueprint.camera.filename_column.is_empty() {
        return Err(ContractError::config_validation(
            "camera.filename_column",
            "filename column cannot be empty",
        ));
    }

    // primary 仅在显式列出相机时可校验，自动发现的相机在加载时检查
    if let Some(primary) = &blueprint.camera.primary {
        if !cameras.is_empty() && !seen.contains(primary.as_str()) {
            return Err(ContractError::config_validation(
                "camera.primary",
                format!("primary camera '{primary}' not found in inputs.cameras"),
            ));
        }
    }

    Ok(())
}

/// 校验输出配置
fn validate_output(blueprint: &SyncBlueprint) -> Result<(), ContractError> {
    let output = &blueprint.output;

    if output.decimals > MAX_DECIMALS {
        return Err(ContractError::config_validation(
            "output.decimals",
            format!("decimals must be <= {MAX_DECIMALS}, got {}", output.decimals),
        ));
    }

    let mut seen = HashSet::new();
    for (idx, sink) in output.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("output.sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("output.sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
    }
    Ok(())
}
