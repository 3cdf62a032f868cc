//! Event bus port: fire-and-forget publishing of status snapshots.

use aroma_domain::event::Event;

/// Publishes status snapshots to interested subscribers.
///
/// Publishing is best-effort: implementations must never block the caller,
/// and a failure to enqueue is theirs to log.
pub trait EventPublisher {
    /// Hand an event over for asynchronous delivery.
    fn publish(&self, event: Event);
}

impl<T: EventPublisher + ?Sized> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: Event) {
        (**self).publish(event);
    }
}
