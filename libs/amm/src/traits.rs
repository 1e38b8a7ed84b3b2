//! State management traits
//!
//! Core trait for components whose whole state can be driven by events and
//! moved across process boundaries as an opaque snapshot.

use crate::error::SnapshotError;

/// Core trait for stateful components that can apply events
pub trait Stateful {
    /// Event type this component can handle
    type Event;

    /// Success payload of one applied event
    type Outcome;

    /// Error type for rejected events
    type Error: std::error::Error + Send + Sync + 'static;

    /// Apply an event to update the state
    fn apply_event(&mut self, event: Self::Event) -> Result<Self::Outcome, Self::Error>;

    /// Create a snapshot of the current state
    fn snapshot(&self) -> Result<Vec<u8>, SnapshotError>;

    /// Restore state from a snapshot; on error the current state is kept
    fn restore(&mut self, snapshot: &[u8]) -> Result<(), SnapshotError>;
}
