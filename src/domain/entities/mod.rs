//! Domain entities - descriptors and triggers with no I/O

pub mod addon;
pub mod command;
pub mod event;
pub mod permission;
pub mod structured;
pub mod trigger;

pub use addon::AddonDescriptor;
pub use command::{CommandDescriptor, CommandFlags, CommandPolicy};
pub use event::EventBinding;
pub use permission::Permissions;
pub use structured::{
    CommandOption, Localizations, Localized, OptionChoice, OptionKind, StructuredCommandDescriptor,
};
pub use trigger::{Arguments, Surface, Trigger};
