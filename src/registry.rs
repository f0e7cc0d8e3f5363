use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::{config::DuplicatePolicy, queue::QueueDescriptor};

/// Outcome of [`QueueRegistry::register`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registered {
    Inserted,
    /// 同名已存在，按 Overwrite 策略替换
    Replaced,
    /// 同名已存在，按 KeepFirst 策略忽略本次
    Kept,
}

/// Application-scoped `name -> descriptor` map.
/// - 写入仅发生在部署阶段；之后多工作线程并发只读。
pub struct QueueRegistry {
    queues: RwLock<HashMap<String, Arc<QueueDescriptor>>>,
    policy: DuplicatePolicy,
}

impl QueueRegistry {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            policy,
        }
    }

    pub fn register(&self, descriptor: QueueDescriptor) -> Registered {
        let mut queues = self.queues.write();
        match queues.get(descriptor.name()) {
            None => {
                queues.insert(descriptor.name().to_string(), Arc::new(descriptor));
                Registered::Inserted
            }
            Some(prev) => match self.policy {
                DuplicatePolicy::Overwrite => {
                    tracing::warn!(queue = %descriptor.name(), previous = %prev.receiver_type(), receiver = %descriptor.receiver_type(), "queue registered multiple times; overriding");
                    queues.insert(descriptor.name().to_string(), Arc::new(descriptor));
                    Registered::Replaced
                }
                DuplicatePolicy::KeepFirst => {
                    tracing::warn!(queue = %descriptor.name(), kept = %prev.receiver_type(), ignored = %descriptor.receiver_type(), "queue registered multiple times; keeping first");
                    Registered::Kept
                }
            },
        }
    }

    /// Whether a queue with the same name as `queue` is registered.
    pub fn contains(&self, queue: &QueueDescriptor) -> bool {
        self.contains_name(queue.name())
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.queues.read().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<QueueDescriptor>> {
        self.queues.read().get(name).cloned()
    }

    /// Snapshot of every registration; the registry keeps sole ownership of its storage.
    pub fn all(&self) -> HashMap<String, Arc<QueueDescriptor>> {
        self.queues.read().clone()
    }

    pub fn len(&self) -> usize {
        self.queues.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.read().is_empty()
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }
}

impl Default for QueueRegistry {
    fn default() -> Self {
        Self::new(DuplicatePolicy::default())
    }
}
