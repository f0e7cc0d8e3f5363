use smallvec::SmallVec;

use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{message::Message, sender::QueueIdentity};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionHandle {
    pub id: Uuid,
    pub app: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    pub id: Uuid,
    pub connection: Uuid,
}

/// Send side produced by a transport for one session and one queue.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, msg: Message) -> anyhow::Result<()>;
}

/// Connection stack consumed by the sender factory. Every call builds a new object;
/// pooling, if any, is the implementation's business.
pub trait Transport: Send + Sync {
    fn create_connection(&self, app_name: &str) -> anyhow::Result<ConnectionHandle>;
    fn create_session(&self, connection: &ConnectionHandle) -> anyhow::Result<SessionHandle>;
    fn create_sender(
        &self,
        session: &SessionHandle,
        queue: &QueueIdentity,
    ) -> anyhow::Result<Box<dyn MessageSink>>;

    /// Called once when the sender built on `session` is dropped.
    fn release(&self, session: &SessionHandle) {
        let _ = session;
    }

    /// Called when a session could not be opened on `connection`.
    fn release_connection(&self, connection: &ConnectionHandle) {
        let _ = connection;
    }
}

impl fmt::Debug for dyn Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transport(..)")
    }
}

pub struct Subscription {
    rx: mpsc::Receiver<Arc<Message>>,
}
impl Subscription {
    pub async fn recv(&mut self) -> Option<Arc<Message>> {
        self.rx.recv().await
    }
}

type Subscribers = SmallVec<[mpsc::Sender<Arc<Message>>; 4]>;

/// Tokio-channel transport living inside the process: queue name -> bounded subscribers.
#[derive(Clone)]
pub struct InProcessTransport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    subs: RwLock<HashMap<String, Subscribers>>,
    // connection id -> app；session id -> connection id
    connections: RwLock<HashMap<Uuid, String>>,
    sessions: RwLock<HashMap<Uuid, Uuid>>,
    default_capacity: usize,
}

impl fmt::Debug for InProcessTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InProcessTransport")
            .field("connections", &self.inner.connections.read().len())
            .finish()
    }
}

impl InProcessTransport {
    pub fn new(default_capacity: usize) -> Self {
        let inner = TransportInner {
            subs: RwLock::new(HashMap::new()),
            connections: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            default_capacity,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn subscribe(&self, queue: &str) -> Subscription {
        let (tx, rx) = mpsc::channel::<Arc<Message>>(self.inner.default_capacity.max(1));
        self.inner
            .subs
            .write()
            .entry(queue.to_string())
            .or_default()
            .push(tx);
        Subscription { rx }
    }

    /// Close a connection; its sessions and senders stop working.
    pub fn close_connection(&self, connection: &ConnectionHandle) {
        // 锁顺序：先 sessions 后 connections
        let mut sessions = self.inner.sessions.write();
        sessions.retain(|_, conn| *conn != connection.id);
        self.inner.connections.write().remove(&connection.id);
    }

    pub fn open_connections(&self) -> usize {
        self.inner.connections.read().len()
    }

    pub fn open_sessions(&self) -> usize {
        self.inner.sessions.read().len()
    }
}

impl TransportInner {
    fn session_open(&self, session: Uuid) -> bool {
        match self.sessions.read().get(&session) {
            Some(conn) => self.connections.read().contains_key(conn),
            None => false,
        }
    }

    async fn publish(&self, queue: &str, msg: Message) {
        let arc = Arc::new(msg);
        let senders: Subscribers = {
            let subs = self.subs.read();
            match subs.get(queue) {
                Some(list) => list.iter().filter(|tx| !tx.is_closed()).cloned().collect(),
                None => SmallVec::new(),
            }
        };
        if senders.is_empty() {
            tracing::debug!(queue = %queue, "no subscriber; message dropped");
            return;
        }
        // try_send 快路径：先尽量非阻塞发送，剩余的再 await
        let mut pending: Subscribers = SmallVec::new();
        for tx in senders.into_iter() {
            match tx.try_send(arc.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => pending.push(tx),
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
        for tx in pending {
            let _ = tx.send(arc.clone()).await;
        }
    }
}

impl Transport for InProcessTransport {
    fn create_connection(&self, app_name: &str) -> anyhow::Result<ConnectionHandle> {
        if app_name.is_empty() {
            anyhow::bail!("connection requires an application name");
        }
        let handle = ConnectionHandle {
            id: Uuid::new_v4(),
            app: app_name.to_string(),
        };
        self.inner
            .connections
            .write()
            .insert(handle.id, handle.app.clone());
        Ok(handle)
    }

    fn create_session(&self, connection: &ConnectionHandle) -> anyhow::Result<SessionHandle> {
        if !self.inner.connections.read().contains_key(&connection.id) {
            anyhow::bail!("connection {} is closed", connection.id);
        }
        let handle = SessionHandle {
            id: Uuid::new_v4(),
            connection: connection.id,
        };
        self.inner.sessions.write().insert(handle.id, connection.id);
        Ok(handle)
    }

    fn create_sender(
        &self,
        session: &SessionHandle,
        queue: &QueueIdentity,
    ) -> anyhow::Result<Box<dyn MessageSink>> {
        if !self.inner.session_open(session.id) {
            anyhow::bail!("session {} is closed", session.id);
        }
        Ok(Box::new(QueueSink {
            queue: queue.name().to_string(),
            session: session.id,
            inner: self.inner.clone(),
        }))
    }

    fn release(&self, session: &SessionHandle) {
        let mut sessions = self.inner.sessions.write();
        sessions.remove(&session.id);
        // 连接不再被任何 session 使用时一并回收
        if !sessions.values().any(|conn| *conn == session.connection) {
            self.inner.connections.write().remove(&session.connection);
        }
    }

    fn release_connection(&self, connection: &ConnectionHandle) {
        self.close_connection(connection);
    }
}

struct QueueSink {
    queue: String,
    session: Uuid,
    inner: Arc<TransportInner>,
}

#[async_trait]
impl MessageSink for QueueSink {
    async fn send(&self, msg: Message) -> anyhow::Result<()> {
        if !self.inner.session_open(self.session) {
            anyhow::bail!("session {} is closed", self.session);
        }
        self.inner.publish(&self.queue, msg).await;
        Ok(())
    }
}
