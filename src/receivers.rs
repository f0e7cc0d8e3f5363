/// Receiver type declared through `#[mmg_queues::receiver]`, collected via inventory.
/// - `name`: the identifier used as `type` in queue descriptors.
pub struct ReceiverRegistration {
    pub name: &'static str,
    pub type_name: fn() -> &'static str,
}

inventory::collect!(ReceiverRegistration);

/// Whether some receiver was declared under `name`.
pub fn is_registered(name: &str) -> bool {
    inventory::iter::<ReceiverRegistration>
        .into_iter()
        .any(|reg| reg.name == name)
}

/// Resolve the Rust type name behind a declared receiver.
pub fn type_name_of(name: &str) -> Option<&'static str> {
    inventory::iter::<ReceiverRegistration>
        .into_iter()
        .find(|reg| reg.name == name)
        .map(|reg| (reg.type_name)())
}

/// Iterate all registrations
pub fn all() -> Vec<&'static ReceiverRegistration> {
    inventory::iter::<ReceiverRegistration>.into_iter().collect()
}
