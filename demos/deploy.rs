//! 部署示例：在临时应用根目录写入队列描述，部署后通过命名树解析出 Sender 并投递一条消息。
use std::sync::Arc;

use mmg_queues::prelude::*;
use mmg_queues::transport::InProcessTransport;

#[mmg_queues::receiver]
struct OrderCreatedHandler;

#[mmg_queues::receiver]
struct JobRunner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let root = std::env::temp_dir().join(format!("mmg-queues-demo-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(root.join("META-INF"))?;
    std::fs::create_dir_all(root.join("WEB-INF"))?;
    std::fs::write(
        root.join("META-INF/message-queues.json"),
        serde_json::to_string_pretty(&serde_json::json!({
            "message-queues": [
                { "type": "OrderCreatedHandler", "destination": "orders/created" },
                { "type": "JobRunner", "destination": "jobs/run" }
            ]
        }))?,
    )?;
    // 缺少根元素：整个来源被跳过，其余来源照常部署
    std::fs::write(root.join("WEB-INF/message-queues.json"), r#"{"queues": []}"#)?;

    let transport = InProcessTransport::new(16);
    let manager = QueueManager::new_with_transport(
        Application::new("shop", &root)?,
        AppConfig::default(),
        Arc::new(transport.clone()),
    );
    let report = manager.initialize()?;
    tracing::info!(registered = report.registered(), failed = report.failures().count(), "deployment report");

    let mut sub = transport.subscribe("orders/created");
    let sender = manager.naming().resolve("orders/created", Some("sess-1"))?;
    sender.send(serde_json::json!({ "order": 42 })).await?;
    if let Some(msg) = sub.recv().await {
        manager.update_monitor(&msg.as_ref().clone().with_state(MessageState::Processed));
    }

    std::fs::remove_dir_all(&root)?;
    Ok(())
}
