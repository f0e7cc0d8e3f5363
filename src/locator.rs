use std::{fmt, sync::Arc};

use crate::{
    error::{QueueError, Result},
    queue::QueueDescriptor,
    registry::QueueRegistry,
};

/// Strategy matching a requested queue against the registry it is handed.
/// The manager owns the registry; the locator owns no state of its own.
pub trait ResourceLocator: Send + Sync {
    /// Fails with [`QueueError::NotFound`] when nothing registered matches.
    fn locate(
        &self,
        registry: &QueueRegistry,
        requested: &QueueDescriptor,
    ) -> Result<Arc<QueueDescriptor>>;
}

impl fmt::Debug for dyn ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceLocator(..)")
    }
}

/// Exact name equality.
#[derive(Debug, Default, Clone, Copy)]
pub struct NameLocator;

impl ResourceLocator for NameLocator {
    fn locate(
        &self,
        registry: &QueueRegistry,
        requested: &QueueDescriptor,
    ) -> Result<Arc<QueueDescriptor>> {
        registry
            .get(requested.name())
            .ok_or_else(|| QueueError::NotFound(requested.name().to_string()))
    }
}
