//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;
pub mod handler;
pub mod probe;
pub mod remote;

pub use bot::{Bot, BotInfo};
pub use handler::{AddonInitializer, CommandHandler, EventHandler, Invocation, Reply};
pub use probe::{PermissionProbe, StaticProbe};
pub use remote::{RateLimitNotice, RemoteCommand, RemoteOption, RemoteRegistry};
