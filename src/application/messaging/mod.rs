//! Trigger handling - parsing, gates, dispatch and platform events

pub mod events;
pub mod gates;
pub mod parser;
pub mod pipeline;

pub use events::{EventBus, SubscriptionId};
pub use gates::{Gate, GateChain, GateContext, OwnerSet};
pub use parser::TriggerParser;
pub use pipeline::{DispatchOutcome, DispatchPipeline, FaultReport};
