//! 子系统错误类型：对调用方暴露 `QueueError`，部署阶段逐个配置源收集 `DeploymentError`。
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    /// 应用标识缺失或非法（名称为空等）
    #[error("invalid application: {0}")]
    InvalidApplication(String),

    /// 定位/查找未命中；与配置错误严格区分
    #[error("queue not found: {0}")]
    NotFound(String),

    #[error("invalid destination {destination:?}: {reason}")]
    InvalidDestination { destination: String, reason: String },

    /// 整个应用根目录无法枚举（单个配置源失败不会走到这里）
    #[error("discovery failed under {}: {source:#}", root.display())]
    Discovery {
        root: PathBuf,
        source: anyhow::Error,
    },

    /// 构造 connection/session/sender 任一步失败，原样上抛，不重试
    #[error("transport failure while {stage} for {queue}: {source:#}")]
    Transport {
        stage: &'static str,
        queue: String,
        source: anyhow::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure of one configuration source. The deployment pass records it and moves on.
#[derive(Error, Debug)]
pub enum DeploymentError {
    #[error("invalid configuration in {}: {message}", path.display())]
    InvalidConfiguration { path: PathBuf, message: String },

    #[error("failed to read descriptors from {}: {source:#}", path.display())]
    Descriptor { path: PathBuf, source: anyhow::Error },

    #[error("invalid queue definition in {}: {reason}", path.display())]
    InvalidDefinition { path: PathBuf, reason: String },

    #[error("unknown receiver type {receiver} for {destination} in {}", path.display())]
    UnknownReceiver {
        path: PathBuf,
        receiver: String,
        destination: String,
    },
}

impl DeploymentError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            DeploymentError::InvalidConfiguration { path, .. }
            | DeploymentError::Descriptor { path, .. }
            | DeploymentError::InvalidDefinition { path, .. }
            | DeploymentError::UnknownReceiver { path, .. } => path,
        }
    }
}

/// Validation failure reported by a [`ConfigValidator`](crate::deploy::ConfigValidator).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct InvalidConfiguration(pub String);

pub type Result<T = ()> = std::result::Result<T, QueueError>;
