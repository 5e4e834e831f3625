//! 配置校验模块
//!
//! 校验规则：
//! - idle_timeout_ms / tick_interval_ms / request_timeout_ms > 0
//! - http sink 的 endpoint 为合法的 http(s) URL
//! - collector.bind 为合法的 socket 地址
//! - collector.database_url 为 sqlite URL
//! - mock 源至少发送一个 instance

use std::net::SocketAddr;

use contracts::{ContractError, ServiceBlueprint, SinkType};
use url::Url;

/// 校验 ServiceBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    validate_grouping(blueprint)?;
    validate_delivery(blueprint)?;
    validate_collector(blueprint)?;
    validate_source(blueprint)?;
    Ok(())
}

fn require_positive(field: &str, value: u64) -> Result<(), ContractError> {
    if value == 0 {
        return Err(ContractError::config_validation(
            field,
            "must be > 0",
        ));
    }
    Ok(())
}

/// 校验分组时序
fn validate_grouping(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    let grouping = &blueprint.grouping;
    require_positive("grouping.idle_timeout_ms", grouping.idle_timeout_ms)?;
    require_positive("grouping.tick_interval_ms", grouping.tick_interval_ms)?;
    Ok(())
}

/// 校验投递配置
fn validate_delivery(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    let delivery = &blueprint.delivery;
    require_positive("delivery.request_timeout_ms", delivery.request_timeout_ms)?;

    if delivery.sink != SinkType::Http {
        return Ok(());
    }

    if delivery.endpoint.trim().is_empty() {
        return Err(ContractError::config_validation(
            "delivery.endpoint",
            "http sink requires an endpoint",
        ));
    }

    let url = Url::parse(&delivery.endpoint).map_err(|e| {
        ContractError::config_validation(
            "delivery.endpoint",
            format!("invalid URL '{}': {e}", delivery.endpoint),
        )
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ContractError::config_validation(
            "delivery.endpoint",
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(())
}

/// 校验 collector 配置
fn validate_collector(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    let collector = &blueprint.collector;

    collector.bind.parse::<SocketAddr>().map_err(|e| {
        ContractError::config_validation(
            "collector.bind",
            format!("invalid socket address '{}': {e}", collector.bind),
        )
    })?;

    if !collector.database_url.starts_with("sqlite:") {
        return Err(ContractError::config_validation(
            "collector.database_url",
            format!("expected a sqlite: URL, got '{}'", collector.database_url),
        ));
    }

    Ok(())
}

/// 校验实例源
fn validate_source(blueprint: &ServiceBlueprint) -> Result<(), ContractError> {
    if blueprint.source.replay_path.is_some() {
        return Ok(());
    }

    let mock = &blueprint.source.mock;
    if mock.series_count == 0 || mock.instances_per_series == 0 {
        return Err(ContractError::config_validation(
            "source.mock",
            "series_count and instances_per_series must be > 0",
        ));
    }
    Ok(())
}
