//! Dispatch gates - ordered eligibility checks run before a handler

use std::collections::HashSet;
use std::sync::Arc;

use tokio::time::Instant;

use crate::application::cooldown::{ceil_secs, CooldownTracker};
use crate::application::errors::Rejection;
use crate::domain::entities::{CommandPolicy, Trigger};
use crate::domain::traits::PermissionProbe;

/// Everything a gate may look at
pub struct GateContext<'a> {
    pub trigger: &'a Trigger,
    /// Canonical command name
    pub command: &'a str,
    pub policy: &'a CommandPolicy,
    pub is_owner: bool,
    pub probe: &'a dyn PermissionProbe,
    pub now: Instant,
}

/// A single check able to short-circuit dispatch
pub trait Gate: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, ctx: &GateContext<'_>) -> Result<(), Rejection>;
}

/// Owner-only commands
pub struct OwnerGate;

impl Gate for OwnerGate {
    fn name(&self) -> &'static str {
        "owner"
    }

    fn check(&self, ctx: &GateContext<'_>) -> Result<(), Rejection> {
        if ctx.policy.flags.owner_only && !ctx.is_owner {
            return Err(Rejection::OwnerOnly);
        }
        Ok(())
    }
}

/// Commands (or the whole bot) under maintenance; owners bypass
pub struct MaintenanceGate {
    pub global: bool,
}

impl Gate for MaintenanceGate {
    fn name(&self) -> &'static str {
        "maintenance"
    }

    fn check(&self, ctx: &GateContext<'_>) -> Result<(), Rejection> {
        if (self.global || ctx.policy.flags.maintenance) && !ctx.is_owner {
            return Err(Rejection::Maintenance);
        }
        Ok(())
    }
}

/// Age-restricted commands outside age-restricted channels
pub struct ContentRatingGate;

impl Gate for ContentRatingGate {
    fn name(&self) -> &'static str {
        "content-rating"
    }

    fn check(&self, ctx: &GateContext<'_>) -> Result<(), Rejection> {
        if ctx.policy.flags.nsfw_only && !ctx.probe.allows_restricted_content(ctx.trigger) {
            return Err(Rejection::NsfwOnly);
        }
        Ok(())
    }
}

pub struct InvokerPermissionGate;

impl Gate for InvokerPermissionGate {
    fn name(&self) -> &'static str {
        "invoker-permissions"
    }

    fn check(&self, ctx: &GateContext<'_>) -> Result<(), Rejection> {
        if ctx.policy.permissions.is_empty() {
            return Ok(());
        }
        let missing = ctx
            .probe
            .invoker_permissions(ctx.trigger)
            .missing(ctx.policy.permissions);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Rejection::MissingPermissions(missing))
        }
    }
}

pub struct BotPermissionGate;

impl Gate for BotPermissionGate {
    fn name(&self) -> &'static str {
        "bot-permissions"
    }

    fn check(&self, ctx: &GateContext<'_>) -> Result<(), Rejection> {
        if ctx.policy.bot_permissions.is_empty() {
            return Ok(());
        }
        let missing = ctx
            .probe
            .bot_permissions(ctx.trigger)
            .missing(ctx.policy.bot_permissions);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Rejection::BotMissingPermissions(missing))
        }
    }
}

/// Consumes the cooldown budget. Must stay last so rejected attempts never burn it.
pub struct CooldownGate {
    tracker: Arc<CooldownTracker>,
}

impl CooldownGate {
    pub fn new(tracker: Arc<CooldownTracker>) -> Self {
        Self { tracker }
    }
}

impl Gate for CooldownGate {
    fn name(&self) -> &'static str {
        "cooldown"
    }

    fn check(&self, ctx: &GateContext<'_>) -> Result<(), Rejection> {
        let Some(cooldown) = ctx.policy.cooldown else {
            return Ok(());
        };
        if cooldown.is_zero() {
            return Ok(());
        }
        self.tracker
            .try_acquire(ctx.command, &ctx.trigger.invoker_id, cooldown, ctx.now)
            .map_err(|remaining| Rejection::Cooldown {
                remaining_secs: ceil_secs(remaining),
            })
    }
}

/// Ordered gate list builder
pub struct GateChain {
    gates: Vec<Arc<dyn Gate>>,
}

impl GateChain {
    pub fn new() -> Self {
        Self { gates: Vec::new() }
    }

    /// Ownership, maintenance, content rating, invoker permissions, bot permissions, cooldown
    pub fn standard(cooldowns: Arc<CooldownTracker>, global_maintenance: bool) -> Self {
        Self::new()
            .add(OwnerGate)
            .add(MaintenanceGate {
                global: global_maintenance,
            })
            .add(ContentRatingGate)
            .add(InvokerPermissionGate)
            .add(BotPermissionGate)
            .add(CooldownGate::new(cooldowns))
    }

    pub fn add<G: Gate + 'static>(mut self, gate: G) -> Self {
        self.gates.push(Arc::new(gate));
        self
    }

    pub fn build(self) -> Vec<Arc<dyn Gate>> {
        self.gates
    }
}

impl Default for GateChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Run gates in order, stopping at the first rejection
pub fn run_gates(gates: &[Arc<dyn Gate>], ctx: &GateContext<'_>) -> Result<(), Rejection> {
    for gate in gates {
        if let Err(rejection) = gate.check(ctx) {
            tracing::debug!(
                "[{}] '{}' rejected by {} gate for {}",
                ctx.trigger.channel_id,
                ctx.command,
                gate.name(),
                ctx.trigger.invoker_id
            );
            return Err(rejection);
        }
    }
    Ok(())
}

/// Owner ids from configuration
#[derive(Debug, Clone, Default)]
pub struct OwnerSet(HashSet<String>);

impl OwnerSet {
    pub fn new<I, S>(owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(owners.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.0.contains(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Permissions;
    use crate::domain::traits::StaticProbe;
    use std::time::Duration;

    fn ctx<'a>(
        trigger: &'a Trigger,
        policy: &'a CommandPolicy,
        probe: &'a StaticProbe,
        is_owner: bool,
    ) -> GateContext<'a> {
        GateContext {
            trigger,
            command: "test",
            policy,
            is_owner,
            probe,
            now: Instant::now(),
        }
    }

    #[test]
    fn test_maintenance_lets_owner_through() {
        let trigger = Trigger::text("1", "c", "test", vec![]);
        let policy = CommandPolicy::default().maintenance();
        let probe = StaticProbe::permissive();
        let gate = MaintenanceGate { global: false };

        assert_eq!(gate.check(&ctx(&trigger, &policy, &probe, false)), Err(Rejection::Maintenance));
        assert!(gate.check(&ctx(&trigger, &policy, &probe, true)).is_ok());
    }

    #[test]
    fn test_global_maintenance_applies_to_every_command() {
        let trigger = Trigger::text("1", "c", "test", vec![]);
        let policy = CommandPolicy::default();
        let probe = StaticProbe::permissive();
        let gate = MaintenanceGate { global: true };

        assert_eq!(gate.check(&ctx(&trigger, &policy, &probe, false)), Err(Rejection::Maintenance));
    }

    #[test]
    fn test_nsfw_gate_uses_channel_rating() {
        let trigger = Trigger::text("1", "c", "test", vec![]).with_context("g");
        let policy = CommandPolicy::default().nsfw_only();
        let mut probe = StaticProbe::permissive();
        probe.restricted_content = false;

        assert_eq!(
            ContentRatingGate.check(&ctx(&trigger, &policy, &probe, true)),
            Err(Rejection::NsfwOnly)
        );
    }

    #[test]
    fn test_permission_gates_enumerate_missing() {
        let trigger = Trigger::text("1", "c", "test", vec![]).with_context("g");
        let policy = CommandPolicy::default()
            .with_permissions(Permissions::BAN_MEMBERS | Permissions::KICK_MEMBERS)
            .with_bot_permissions(Permissions::BAN_MEMBERS);
        let probe = StaticProbe {
            invoker: Permissions::KICK_MEMBERS,
            bot: Permissions::SEND_MESSAGES,
            restricted_content: false,
        };

        assert_eq!(
            InvokerPermissionGate.check(&ctx(&trigger, &policy, &probe, false)),
            Err(Rejection::MissingPermissions(Permissions::BAN_MEMBERS))
        );
        assert_eq!(
            BotPermissionGate.check(&ctx(&trigger, &policy, &probe, false)),
            Err(Rejection::BotMissingPermissions(Permissions::BAN_MEMBERS))
        );
    }

    #[test]
    fn test_chain_stops_before_cooldown() {
        let tracker = Arc::new(CooldownTracker::new());
        let gates = GateChain::standard(tracker.clone(), false).build();
        let trigger = Trigger::text("1", "c", "test", vec![]);
        let policy = CommandPolicy::default()
            .owner_only()
            .with_cooldown(Duration::from_secs(30));
        let probe = StaticProbe::permissive();

        assert_eq!(
            run_gates(&gates, &ctx(&trigger, &policy, &probe, false)),
            Err(Rejection::OwnerOnly)
        );
        assert!(tracker.is_empty());
    }
}
