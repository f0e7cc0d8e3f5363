pub mod config;
pub mod deploy;
pub mod error;
pub mod locator;
pub mod manager;
pub mod message;
pub mod naming;
pub mod queue;
pub mod receivers;
pub mod registry;
pub mod sender;
pub mod transport;

// 允许在本 crate 内通过 `mmg_queues::...` 自引用（供 proc-macro 展开使用）
extern crate self as mmg_queues;

pub mod prelude {
    pub use crate::config::{AppConfig, DuplicatePolicy};
    pub use crate::deploy::DeploymentReport;
    pub use crate::error::{DeploymentError, QueueError, Result};
    pub use crate::manager::{Application, QueueManager};
    pub use crate::message::{Message, MessageState};
    pub use crate::queue::QueueDescriptor;
    pub use crate::sender::Sender;
}

pub use queues_macros::*;

// proc-macro 展开依赖 inventory；重导出以免使用方单独声明依赖
#[doc(hidden)]
pub use inventory as __inventory;
