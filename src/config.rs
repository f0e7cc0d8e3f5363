use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How a second registration under an already-registered queue name is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// 后写覆盖（记录告警）
    #[default]
    Overwrite,
    /// 保留首次注册（记录告警，忽略后续定义）
    KeepFirst,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub queue_capacity: usize,
    pub descriptor_patterns: Vec<String>,
    pub duplicate_policy: DuplicatePolicy,
    pub strict_receivers: bool,
}

pub const APP_DEFAULT_QUEUE: usize = 1024;
pub const DEFAULT_DESCRIPTOR_PATTERNS: [&str; 2] =
    ["META-INF/message-queues.json", "WEB-INF/message-queues.json"];

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            queue_capacity: APP_DEFAULT_QUEUE,
            descriptor_patterns: DEFAULT_DESCRIPTOR_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            duplicate_policy: DuplicatePolicy::default(),
            strict_receivers: false,
        }
    }
}

impl AppConfig {
    /// Load from a JSON file; absent keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let cfg = serde_json::from_str(&raw)?;
        Ok(cfg)
    }
}
// 配置仅在创建 QueueManager 时提供；运行期不支持修改。
