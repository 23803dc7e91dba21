//! Dispatch pipeline - Routes triggers through gates to handlers

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::gates::{run_gates, Gate, GateChain, GateContext, OwnerSet};
use crate::application::errors::Rejection;
use crate::application::runtime::RuntimeContext;
use crate::domain::entities::{
    CommandDescriptor, CommandPolicy, StructuredCommandDescriptor, Surface, Trigger,
};
use crate::domain::traits::{CommandHandler, Invocation, PermissionProbe, Reply};

/// Shown to the invoker when a handler fails; details only go to the logs
pub const GENERIC_FAILURE: &str = "Something went wrong while running that command.";

/// Diagnostics for the operator channel
#[derive(Debug, Clone)]
pub struct FaultReport {
    pub id: String,
    pub command: String,
    pub invoker_id: String,
    pub channel_id: String,
    pub context_id: Option<String>,
    pub detail: String,
    pub occurred_at: DateTime<Utc>,
}

/// How a trigger ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No command by that name; nothing is sent back
    Dropped,
    Rejected { command: String, rejection: Rejection },
    Completed { command: String, reply: Reply },
    Failed { command: String, fault_id: String },
}

impl DispatchOutcome {
    /// What to send back to the invoker, if anything
    pub fn reply(&self) -> Option<Reply> {
        match self {
            DispatchOutcome::Dropped => None,
            DispatchOutcome::Rejected { rejection, .. } => {
                Some(Reply::ephemeral(rejection.to_string()))
            }
            DispatchOutcome::Completed { reply, .. } => Some(reply.clone()),
            DispatchOutcome::Failed { fault_id, .. } => Some(Reply::ephemeral(format!(
                "{} (ref {})",
                GENERIC_FAILURE,
                &fault_id[..8.min(fault_id.len())]
            ))),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, DispatchOutcome::Completed { .. })
    }
}

/// Descriptor a trigger resolved to, from either surface
#[derive(Clone)]
enum Target {
    Text(Arc<CommandDescriptor>),
    Structured(Arc<StructuredCommandDescriptor>),
}

impl Target {
    fn name(&self) -> &str {
        match self {
            Target::Text(d) => &d.name,
            Target::Structured(d) => &d.name,
        }
    }

    fn policy(&self) -> &CommandPolicy {
        match self {
            Target::Text(d) => &d.policy,
            Target::Structured(d) => &d.policy,
        }
    }

    fn handler(&self) -> Arc<dyn CommandHandler> {
        match self {
            Target::Text(d) => d.handler.clone(),
            Target::Structured(d) => d.handler.clone(),
        }
    }

    fn response(&self) -> Option<String> {
        match self {
            Target::Text(d) => d.response.clone(),
            Target::Structured(d) => d.response.clone(),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Resolves triggers, runs the gate sequence and executes handlers.
///
/// Text and structured triggers share one pipeline, so they share cooldowns
/// for commands of the same name.
pub struct DispatchPipeline {
    runtime: Arc<RuntimeContext>,
    probe: Arc<dyn PermissionProbe>,
    gates: Vec<Arc<dyn Gate>>,
    owners: OwnerSet,
    handler_timeout: Option<Duration>,
    faults: Option<mpsc::UnboundedSender<FaultReport>>,
}

impl DispatchPipeline {
    pub fn new(runtime: Arc<RuntimeContext>, probe: Arc<dyn PermissionProbe>) -> Self {
        let gates = GateChain::standard(
            runtime.cooldowns.clone(),
            runtime.config.dispatch.maintenance,
        )
        .build();
        Self {
            owners: OwnerSet::new(runtime.config.bot.owners.iter().cloned()),
            handler_timeout: runtime.config.dispatch.handler_timeout(),
            runtime,
            probe,
            gates,
            faults: None,
        }
    }

    /// Forward handler faults to an operator channel
    pub fn with_fault_channel(mut self, sender: mpsc::UnboundedSender<FaultReport>) -> Self {
        self.faults = Some(sender);
        self
    }

    pub fn with_handler_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handler_timeout = timeout;
        self
    }

    pub fn with_gates(mut self, gates: Vec<Arc<dyn Gate>>) -> Self {
        self.gates = gates;
        self
    }

    fn resolve(&self, trigger: &Trigger) -> Option<Target> {
        match trigger.surface {
            Surface::Text => self.runtime.registry.lookup(&trigger.command).map(Target::Text),
            Surface::Structured => self
                .runtime
                .registry
                .lookup_structured(&trigger.command)
                .map(Target::Structured),
        }
    }

    /// Handle one trigger. Never panics and never returns an error: every
    /// failure mode maps to a [`DispatchOutcome`].
    pub async fn handle(&self, trigger: Trigger) -> DispatchOutcome {
        let Some(target) = self.resolve(&trigger) else {
            tracing::debug!(
                "[{}] Dropping unknown {} command '{}'",
                trigger.channel_id,
                trigger.surface.as_str(),
                trigger.command
            );
            return DispatchOutcome::Dropped;
        };
        let command = target.name().to_string();

        let gate_ctx = GateContext {
            trigger: &trigger,
            command: &command,
            policy: target.policy(),
            is_owner: self.owners.contains(&trigger.invoker_id),
            probe: self.probe.as_ref(),
            now: Instant::now(),
        };
        if let Err(rejection) = run_gates(&self.gates, &gate_ctx) {
            return DispatchOutcome::Rejected { command, rejection };
        }

        tracing::debug!(
            "[{}] {} runs '{}' ({})",
            trigger.channel_id,
            trigger.invoker_id,
            command,
            trigger.surface.as_str()
        );
        self.execute(target, trigger, command).await
    }

    async fn execute(&self, target: Target, trigger: Trigger, command: String) -> DispatchOutcome {
        let invocation = Invocation {
            trigger: trigger.clone(),
            command: command.clone(),
            response: target.response(),
            runtime: self.runtime.clone(),
        };
        let handler = target.handler();
        let mut task = tokio::spawn(async move { handler.execute(invocation).await });

        let joined = match self.handler_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    task.abort();
                    return self.fault(
                        &trigger,
                        command,
                        format!("handler timed out after {}s", limit.as_secs_f64()),
                    );
                }
            },
            None => task.await,
        };

        match joined {
            Ok(Ok(reply)) => DispatchOutcome::Completed { command, reply },
            Ok(Err(e)) => self.fault(&trigger, command, format!("handler error: {}", e)),
            Err(e) if e.is_panic() => {
                let message = panic_message(e.into_panic());
                self.fault(&trigger, command, format!("handler panicked: {}", message))
            }
            Err(e) => self.fault(&trigger, command, format!("handler task failed: {}", e)),
        }
    }

    fn fault(&self, trigger: &Trigger, command: String, detail: String) -> DispatchOutcome {
        let report = FaultReport {
            id: uuid::Uuid::new_v4().to_string(),
            command: command.clone(),
            invoker_id: trigger.invoker_id.clone(),
            channel_id: trigger.channel_id.clone(),
            context_id: trigger.context_id.clone(),
            detail,
            occurred_at: Utc::now(),
        };

        tracing::error!(
            fault_id = %report.id,
            command = %report.command,
            invoker = %report.invoker_id,
            channel = %report.channel_id,
            context = ?report.context_id,
            surface = trigger.surface.as_str(),
            arguments = %trigger.arguments.joined(),
            "Command handler fault: {}",
            report.detail
        );

        if let Some(sender) = &self.faults {
            if sender.send(report.clone()).is_err() {
                tracing::warn!("Operator fault channel is closed");
            }
        }

        DispatchOutcome::Failed {
            command,
            fault_id: report.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::HandlerError;
    use crate::application::handlers::HandlerTable;
    use crate::domain::traits::StaticProbe;
    use crate::infrastructure::config::Config;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting(AtomicUsize);

    #[async_trait]
    impl CommandHandler for Counting {
        async fn execute(&self, invocation: Invocation) -> Result<Reply, HandlerError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Reply::new(format!("ran {}", invocation.command)))
        }
    }

    struct Failing;

    #[async_trait]
    impl CommandHandler for Failing {
        async fn execute(&self, _invocation: Invocation) -> Result<Reply, HandlerError> {
            Err(HandlerError::ExecutionFailed("database is on fire".to_string()))
        }
    }

    struct Panicking;

    #[async_trait]
    impl CommandHandler for Panicking {
        async fn execute(&self, _invocation: Invocation) -> Result<Reply, HandlerError> {
            panic!("index out of bounds");
        }
    }

    struct Sleeping;

    #[async_trait]
    impl CommandHandler for Sleeping {
        async fn execute(&self, _invocation: Invocation) -> Result<Reply, HandlerError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Reply::new("late"))
        }
    }

    fn runtime(owners: &[&str]) -> Arc<RuntimeContext> {
        let mut config = Config::default();
        config.bot.owners = owners.iter().map(|s| s.to_string()).collect();
        RuntimeContext::assemble(Arc::new(config), Arc::new(HandlerTable::new()))
    }

    fn pipeline(runtime: &Arc<RuntimeContext>) -> DispatchPipeline {
        DispatchPipeline::new(runtime.clone(), Arc::new(StaticProbe::permissive()))
    }

    #[tokio::test]
    async fn test_unknown_command_is_dropped() {
        let runtime = runtime(&[]);
        let outcome = pipeline(&runtime)
            .handle(Trigger::text("u1", "c1", "nope", vec![]))
            .await;
        assert_eq!(outcome, DispatchOutcome::Dropped);
        assert!(outcome.reply().is_none());
    }

    #[tokio::test]
    async fn test_alias_runs_canonical_command() {
        let runtime = runtime(&[]);
        let handler = Arc::new(Counting::default());
        runtime.registry.register(
            CommandDescriptor::new("greet", handler.clone()).with_aliases(vec!["hi".to_string()]),
        );

        let outcome = pipeline(&runtime)
            .handle(Trigger::text("u1", "c1", "HI", vec![]))
            .await;
        assert_eq!(
            outcome,
            DispatchOutcome::Completed {
                command: "greet".to_string(),
                reply: Reply::new("ran greet"),
            }
        );
        assert_eq!(handler.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_owner_only_rejects_non_owner_without_running() {
        let runtime = runtime(&["owner"]);
        let handler = Arc::new(Counting::default());
        runtime.registry.register(
            CommandDescriptor::new("shutdown", handler.clone())
                .with_policy(CommandPolicy::default().owner_only()),
        );
        let pipeline = pipeline(&runtime);

        let outcome = pipeline
            .handle(Trigger::text("stranger", "c1", "shutdown", vec![]))
            .await;
        assert_eq!(
            outcome,
            DispatchOutcome::Rejected {
                command: "shutdown".to_string(),
                rejection: Rejection::OwnerOnly,
            }
        );
        assert_eq!(handler.0.load(Ordering::SeqCst), 0);

        let outcome = pipeline
            .handle(Trigger::text("owner", "c1", "shutdown", vec![]))
            .await;
        assert!(outcome.is_completed());
        assert_eq!(handler.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_window() {
        let runtime = runtime(&[]);
        let handler = Arc::new(Counting::default());
        runtime.registry.register(
            CommandDescriptor::new("roll", handler.clone())
                .with_policy(CommandPolicy::default().with_cooldown(Duration::from_secs(5))),
        );
        let pipeline = pipeline(&runtime);
        let trigger = || Trigger::text("u1", "c1", "roll", vec![]);

        assert!(pipeline.handle(trigger()).await.is_completed());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(
            pipeline.handle(trigger()).await,
            DispatchOutcome::Rejected {
                command: "roll".to_string(),
                rejection: Rejection::Cooldown { remaining_secs: 3 },
            }
        );

        // Other users have their own window
        assert!(pipeline
            .handle(Trigger::text("u2", "c1", "roll", vec![]))
            .await
            .is_completed());

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(pipeline.handle(trigger()).await.is_completed());
        assert_eq!(handler.0.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_handler_error_becomes_fault() {
        let runtime = runtime(&[]);
        runtime
            .registry
            .register(CommandDescriptor::new("broken", Arc::new(Failing)));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let pipeline = pipeline(&runtime).with_fault_channel(tx);

        let outcome = pipeline
            .handle(Trigger::text("u1", "c1", "broken", vec![]).with_context("g1"))
            .await;
        let DispatchOutcome::Failed { command, fault_id } = &outcome else {
            panic!("expected a fault, got {:?}", outcome);
        };
        assert_eq!(command, "broken");

        let report = rx.recv().await.unwrap();
        assert_eq!(&report.id, fault_id);
        assert_eq!(report.context_id.as_deref(), Some("g1"));
        assert!(report.detail.contains("database is on fire"));

        // The invoker only sees the generic message
        let reply = outcome.reply().unwrap();
        assert!(reply.content.starts_with(GENERIC_FAILURE));
        assert!(!reply.content.contains("fire"));
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        let runtime = runtime(&[]);
        runtime
            .registry
            .register(CommandDescriptor::new("explode", Arc::new(Panicking)));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let pipeline = pipeline(&runtime).with_fault_channel(tx);

        let outcome = pipeline
            .handle(Trigger::text("u1", "c1", "explode", vec![]))
            .await;
        assert!(matches!(outcome, DispatchOutcome::Failed { .. }));
        assert!(rx.recv().await.unwrap().detail.contains("index out of bounds"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_handler_times_out() {
        let runtime = runtime(&[]);
        runtime
            .registry
            .register(CommandDescriptor::new("slow", Arc::new(Sleeping)));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let pipeline = pipeline(&runtime)
            .with_handler_timeout(Some(Duration::from_secs(1)))
            .with_fault_channel(tx);

        let outcome = pipeline.handle(Trigger::text("u1", "c1", "slow", vec![])).await;
        assert!(matches!(outcome, DispatchOutcome::Failed { .. }));
        assert!(rx.recv().await.unwrap().detail.contains("timed out"));
    }

    #[tokio::test]
    async fn test_structured_surface_uses_structured_index() {
        let runtime = runtime(&[]);
        let text = Arc::new(Counting::default());
        let structured = Arc::new(Counting::default());
        runtime
            .registry
            .register(CommandDescriptor::new("info", text.clone()));
        runtime.registry.register_structured(StructuredCommandDescriptor::new(
            "info",
            "Show info",
            structured.clone(),
        ));

        let outcome = pipeline(&runtime)
            .handle(Trigger::structured("u1", "c1", "info", Default::default()))
            .await;
        assert!(outcome.is_completed());
        assert_eq!(text.0.load(Ordering::SeqCst), 0);
        assert_eq!(structured.0.load(Ordering::SeqCst), 1);
    }
}
