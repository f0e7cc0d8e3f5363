use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    config::AppConfig,
    deploy::{DeployTarget, Deployer, DeploymentReport},
    error::{QueueError, Result},
    locator::{NameLocator, ResourceLocator},
    message::Message,
    naming::NamingTree,
    queue::QueueDescriptor,
    registry::QueueRegistry,
    sender::{Sender, SenderFactory},
    transport::{InProcessTransport, Transport},
};

/// The running application that owns one queue manager.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Application {
    name: String,
    root: PathBuf,
}

impl Application {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(QueueError::InvalidApplication(
                "application name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            name,
            root: root.into(),
        })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Queue registry, naming tree and sender resolution for one application.
///
/// `initialize()` 在应用启动阶段单线程执行；之后可包进 `Arc` 供多个工作线程并发读取。
pub struct QueueManager {
    app: Application,
    cfg: AppConfig,
    registry: QueueRegistry,
    naming: NamingTree,
    factory: Arc<SenderFactory>,
    locator: Arc<dyn ResourceLocator>,
    deployer: Deployer,
}

impl QueueManager {
    pub fn new(app: Application, cfg: AppConfig) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(InProcessTransport::new(cfg.queue_capacity));
        Self::new_with_transport(app, cfg, transport)
    }

    /// Build on an explicit transport. The transport is fixed for the manager's lifetime, so
    /// naming bindings and `create_sender_for_queue` always share one factory.
    pub fn new_with_transport(app: Application, cfg: AppConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry: QueueRegistry::new(cfg.duplicate_policy),
            naming: NamingTree::new(app.name()),
            factory: Arc::new(SenderFactory::new(app.name(), transport)),
            locator: Arc::new(NameLocator),
            deployer: Deployer::new(&cfg),
            app,
            cfg,
        }
    }

    pub fn with_locator(mut self, locator: Arc<dyn ResourceLocator>) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_deployer(mut self, deployer: Deployer) -> Self {
        self.deployer = deployer;
        self
    }

    /// Discover, validate and register every queue source under the application root.
    /// 可重复调用：重复定义按 DuplicatePolicy 处理，绑定后写覆盖。
    pub fn initialize(&self) -> Result<DeploymentReport> {
        tracing::info!(app = %self.app.name(), root = %self.app.root().display(), "deploying message queues");
        let target = DeployTarget {
            registry: &self.registry,
            naming: &self.naming,
            factory: &self.factory,
        };
        self.deployer.deploy(self.app.root(), &target)
    }

    pub fn get_queues(&self) -> HashMap<String, Arc<QueueDescriptor>> {
        self.registry.all()
    }

    /// Membership by name, independent of the locator.
    pub fn has_queue(&self, queue: impl AsRef<str>) -> bool {
        self.registry.contains_name(queue.as_ref())
    }

    pub fn locate(&self, queue: &QueueDescriptor) -> Result<Arc<QueueDescriptor>> {
        self.locator.locate(&self.registry, queue)
    }

    /// Fresh connection/session/sender for `lookup_name`; nothing is shared between calls.
    pub fn create_sender_for_queue(
        &self,
        lookup_name: &str,
        session_id: Option<&str>,
    ) -> Result<Sender> {
        self.factory.create_sender(lookup_name, session_id)
    }

    /// Observational hook only; never affects delivery.
    pub fn update_monitor(&self, message: &Message) {
        tracing::info!(
            target: "mmg_queues::monitor",
            app = %self.app.name(),
            message = %message.id,
            destination = %message.destination,
            state = ?message.state,
            session = ?message.session_id,
            "message state updated"
        );
    }

    pub fn naming(&self) -> &NamingTree {
        &self.naming
    }

    pub fn registry(&self) -> &QueueRegistry {
        &self.registry
    }

    pub fn application(&self) -> &Application {
        &self.app
    }

    pub fn sender_factory(&self) -> &Arc<SenderFactory> {
        &self.factory
    }

    pub fn config(&self) -> &AppConfig {
        &self.cfg
    }
}
