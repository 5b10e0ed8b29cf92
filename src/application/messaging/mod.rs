//! Message handling - Queueing, session tracking and routing

pub mod dispatcher;
pub mod parser;
pub mod queue;
pub mod registry;

pub use dispatcher::{DispatchStats, DispatcherHandle, DispatcherState, DropReason, MessageDispatcher, RouteOutcome};
pub use parser::{Input, InputParser};
pub use queue::{envelope_queue, EnvelopeQueue, EnvelopeReceiver};
pub use registry::{SessionHandle, SessionRegistry};
