use mmg_queues::prelude::*;
use mmg_queues::registry::{QueueRegistry, Registered};

#[test]
fn register_then_contains_by_name() {
    let reg = QueueRegistry::default();
    assert!(reg.is_empty());
    assert_eq!(
        reg.register(QueueDescriptor::new("orders/created", "OrderCreatedHandler")),
        Registered::Inserted
    );
    // 仅按名称判断，接收者类型不参与比较
    assert!(reg.contains(&QueueDescriptor::new("orders/created", "Other")));
    assert!(!reg.contains(&QueueDescriptor::new("orders", "OrderCreatedHandler")));
    assert_eq!(reg.len(), 1);
}

#[test]
fn overwrite_policy_replaces() {
    let reg = QueueRegistry::new(DuplicatePolicy::Overwrite);
    reg.register(QueueDescriptor::new("work", "A"));
    assert_eq!(reg.register(QueueDescriptor::new("work", "B")), Registered::Replaced);
    assert_eq!(reg.get("work").unwrap().receiver_type(), "B");
    assert_eq!(reg.len(), 1);
}

#[test]
fn keep_first_policy_keeps() {
    let reg = QueueRegistry::new(DuplicatePolicy::KeepFirst);
    reg.register(QueueDescriptor::new("work", "A"));
    assert_eq!(reg.register(QueueDescriptor::new("work", "B")), Registered::Kept);
    assert_eq!(reg.get("work").unwrap().receiver_type(), "A");
    assert_eq!(reg.policy(), DuplicatePolicy::KeepFirst);
}

#[test]
fn all_is_a_detached_snapshot() {
    let reg = QueueRegistry::default();
    reg.register(QueueDescriptor::new("a", "A"));
    let mut snapshot = reg.all();
    snapshot.clear();
    assert_eq!(reg.all().len(), 1);
    assert_eq!(reg.all()["a"].name(), "a");
}
