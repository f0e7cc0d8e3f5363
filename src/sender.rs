use std::{fmt, sync::Arc};

use uuid::Uuid;

use crate::{
    error::{QueueError, Result},
    message::Message,
    transport::{ConnectionHandle, MessageSink, SessionHandle, Transport},
};

/// Transport-facing identity of a queue, built from a lookup name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueueIdentity {
    name: String,
}
impl QueueIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Send handle bound to one fresh connection/session pair.
pub struct Sender {
    id: Uuid,
    queue: QueueIdentity,
    connection: ConnectionHandle,
    session: SessionHandle,
    session_id: Option<String>,
    sink: Box<dyn MessageSink>,
    transport: Arc<dyn Transport>,
}

impl Sender {
    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn queue(&self) -> &QueueIdentity {
        &self.queue
    }
    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }
    /// Session token the sender was requested with; carried onto every message, never interpreted.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Build a message addressed to this sender's queue and send it. Returns the message id.
    pub async fn send(&self, body: serde_json::Value) -> Result<Uuid> {
        let msg = Message::new(self.queue.name(), body).with_session(self.session_id.clone());
        let id = msg.id;
        self.sink
            .send(msg)
            .await
            .map_err(|source| QueueError::Transport {
                stage: "sending",
                queue: self.queue.name().to_string(),
                source,
            })?;
        Ok(id)
    }
}

impl Drop for Sender {
    fn drop(&mut self) {
        self.transport.release(&self.session);
    }
}

impl fmt::Debug for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("id", &self.id)
            .field("queue", &self.queue)
            .field("connection", &self.connection.id)
            .field("session", &self.session.id)
            .field("session_id", &self.session_id)
            .finish()
    }
}

/// Builds a brand-new connection -> session -> sender chain per call.
/// 与共享注册表无关：每次调用相互独立，无需加锁。
#[derive(Clone)]
pub struct SenderFactory {
    app_name: String,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for SenderFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderFactory")
            .field("app_name", &self.app_name)
            .finish()
    }
}

impl SenderFactory {
    pub fn new(app_name: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            app_name: app_name.into(),
            transport,
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn create_sender(&self, lookup_name: &str, session_id: Option<&str>) -> Result<Sender> {
        // 应用名决定连接目标
        if self.app_name.is_empty() {
            return Err(QueueError::InvalidApplication(
                "owning application has no name".to_string(),
            ));
        }
        let queue = QueueIdentity::new(lookup_name);
        let fail = |stage: &'static str| {
            move |source: anyhow::Error| QueueError::Transport {
                stage,
                queue: lookup_name.to_string(),
                source,
            }
        };
        let connection = self
            .transport
            .create_connection(&self.app_name)
            .map_err(fail("opening connection"))?;
        let session = match self.transport.create_session(&connection) {
            Ok(session) => session,
            Err(e) => {
                self.transport.release_connection(&connection);
                return Err(fail("opening session")(e));
            }
        };
        let sink = match self.transport.create_sender(&session, &queue) {
            Ok(sink) => sink,
            Err(e) => {
                self.transport.release(&session);
                return Err(fail("creating sender")(e));
            }
        };
        tracing::debug!(app = %self.app_name, queue = %lookup_name, connection = %connection.id, session = %session.id, "sender created");
        Ok(Sender {
            id: Uuid::new_v4(),
            queue,
            connection,
            session,
            session_id: session_id.map(str::to_string),
            sink,
            transport: self.transport.clone(),
        })
    }
}
