//! 容器配置

use crate::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 钩子链模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookChainMode {
    /// 组件自己的钩子只在自身注册时调用，外部处理器单独成链
    #[default]
    PerType,
    /// 组件的钩子追加到容器级钩子链，每次注册都调用整条链
    Accumulated,
}

/// 容器配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 钩子链模式
    pub hook_chain_mode: HookChainMode,
    /// 依赖未解析时是否让该组件注册失败
    pub strict_dependencies: bool,
    /// `initialize()` 是否重复调用已激活实例的 post-construct 方法
    pub reactivate_on_initialize: bool,
}

impl ContainerConfig {
    /// 从 TOML 文本加载
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }

    /// 从 JSON 文本加载
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }

    /// 从文件加载，按扩展名选择格式
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(ConfigError::UnsupportedFormat {
                extension: other.unwrap_or_default().to_string(),
            }),
        }
    }

    /// 设置钩子链模式
    pub fn with_hook_chain_mode(mut self, mode: HookChainMode) -> Self {
        self.hook_chain_mode = mode;
        self
    }

    /// 设置严格依赖模式
    pub fn with_strict_dependencies(mut self, strict: bool) -> Self {
        self.strict_dependencies = strict;
        self
    }

    /// 设置是否重复激活
    pub fn with_reactivate_on_initialize(mut self, reactivate: bool) -> Self {
        self.reactivate_on_initialize = reactivate;
        self
    }
}
