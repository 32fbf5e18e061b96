use uuid::Uuid;

// ============================================================================
// Aggregate Root Pattern
// ============================================================================
//
// Key Principles:
// 1. Commands are validated against current state before anything changes
// 2. Accepted commands emit events describing what happened
// 3. State only moves by applying events
// 4. Aggregates enforce business invariants
//
// Persistence stores the resulting snapshot. Services log the emitted
// events by name once the write lands.
//
// ============================================================================

/// Generic aggregate trait
///
/// Type Parameters:
/// - `Event`: The domain event type for this aggregate
/// - `Command`: The command type for this aggregate
/// - `Error`: The error type for business rule violations
pub trait Aggregate: Sized + Clone + Send + Sync {
    type Event: DomainEvent;
    type Command;
    type Error;

    /// Create new aggregate from first event
    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error>;

    /// Apply subsequent events to update state
    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Handle command and emit events (business logic)
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Get aggregate ID
    fn aggregate_id(&self) -> Uuid;

    /// Handle a command and return the next state alongside the emitted events.
    /// `self` is left untouched so callers can keep it as the write precondition.
    fn execute(&self, command: &Self::Command) -> Result<(Self, Vec<Self::Event>), Self::Error> {
        let events = self.handle_command(command)?;
        let mut next = self.clone();
        for event in &events {
            next.apply_event(event)?;
        }
        Ok((next, events))
    }
}

/// Domain events expose a stable name for logs and metrics.
pub trait DomainEvent: Clone + Send + Sync {
    fn event_type(&self) -> &'static str;
}
