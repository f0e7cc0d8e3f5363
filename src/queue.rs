use std::fmt;

/// A deployed queue: hierarchical name plus the receiver type bound to it. Immutable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueueDescriptor {
    name: String,
    receiver_type: String,
}

impl QueueDescriptor {
    pub fn new(name: impl Into<String>, receiver_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            receiver_type: receiver_type.into(),
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn receiver_type(&self) -> &str {
        &self.receiver_type
    }
}

impl AsRef<str> for QueueDescriptor {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for QueueDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.receiver_type)
    }
}

/// One `(destination, type)` pair as read from a declarative source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueDefinition {
    pub destination: String,
    pub receiver_type: String,
}

impl QueueDefinition {
    pub fn new(destination: impl Into<String>, receiver_type: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            receiver_type: receiver_type.into(),
        }
    }

    pub fn to_descriptor(&self) -> QueueDescriptor {
        QueueDescriptor::new(self.destination.clone(), self.receiver_type.clone())
    }
}

/// Checks a slash-delimited destination: non-empty, no leading/trailing slash, no empty segment.
pub fn check_destination(destination: &str) -> std::result::Result<(), String> {
    if destination.is_empty() {
        return Err("empty destination".to_string());
    }
    if destination.split('/').any(str::is_empty) {
        return Err(format!("destination {destination:?} contains an empty segment"));
    }
    Ok(())
}
