// ── Platform notification seam ──
//
// The reconciler reports entity changes through this trait and never
// depends on a concrete platform type.

use crate::error::CoreError;
use crate::model::PresenceEntity;

/// Receives entity lifecycle notifications from the reconciler and scheduler.
///
/// Calls happen while the single writer holds its lock, so implementations
/// should hand work off rather than block.
pub trait PresenceSink: Send + Sync {
    /// A device was seen for the first time.
    fn create(&self, entity: &PresenceEntity);

    /// A known device's state was written after a successful poll.
    fn update(&self, entity: &PresenceEntity);

    /// A fetch failed; entity state is stale until the next success.
    fn mark_unavailable(&self, error: &CoreError);
}

/// Sink that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PresenceSink for NullSink {
    fn create(&self, _entity: &PresenceEntity) {}

    fn update(&self, _entity: &PresenceEntity) {}

    fn mark_unavailable(&self, _error: &CoreError) {}
}
