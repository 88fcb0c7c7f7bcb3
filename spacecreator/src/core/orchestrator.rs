use std::cell::Cell;
use std::fmt;

use spacecreator_ipc::CreateSpaceOutcome;

use crate::platform::Platform;

use super::config::{Config, Timings};
use super::display::{DisplayResolver, TargetDisplay};
use super::notification::NotificationSink;
use super::permission::{PermissionGate, TrustState};
use super::strategy::{AttemptResult, StrategyChain, StrategyKind};

/// Where the current invocation is. Terminal states are not kept: once an
/// invocation ends the orchestrator is back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    CheckingPermission,
    ResolvingDisplay,
    RunningStrategies(StrategyKind),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => f.write_str("idle"),
            Phase::CheckingPermission => f.write_str("checking-permission"),
            Phase::ResolvingDisplay => f.write_str("resolving-display"),
            Phase::RunningStrategies(kind) => write!(f, "running-strategies({})", kind),
        }
    }
}

/// Everything one invocation observed, mostly for logs and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationReport {
    pub outcome: CreateSpaceOutcome,
    pub trust: TrustState,
    pub target: Option<TargetDisplay>,
    pub attempts: Vec<(StrategyKind, AttemptResult)>,
}

impl InvocationReport {
    fn short(outcome: CreateSpaceOutcome, trust: TrustState) -> Self {
        Self {
            outcome,
            trust,
            target: None,
            attempts: Vec::new(),
        }
    }
}

/// Returns the orchestrator to `Idle` however the invocation ends.
struct PhaseGuard<'a> {
    phase: &'a Cell<Phase>,
}

impl<'a> PhaseGuard<'a> {
    fn enter(phase: &'a Cell<Phase>) -> Self {
        phase.set(Phase::CheckingPermission);
        Self { phase }
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.phase.set(Phase::Idle);
    }
}

/// Drives one space creation from permission check to notification.
///
/// Lives on a single-threaded executor. Delays between automation phases
/// are timers, so other triggers are received while an invocation waits;
/// those are answered with [`CreateSpaceOutcome::Busy`] instead of starting
/// a second run against the same overview.
pub struct Orchestrator<P> {
    platform: P,
    timings: Timings,
    strategy_order: Vec<StrategyKind>,
    phase: Cell<Phase>,
}

impl<P: Platform> Orchestrator<P> {
    pub fn new(platform: P, config: &Config) -> Self {
        Self {
            platform,
            timings: config.timings,
            strategy_order: StrategyKind::DECLARED_ORDER.to_vec(),
            phase: Cell::new(Phase::Idle),
        }
    }

    pub fn with_strategy_order(mut self, order: Vec<StrategyKind>) -> Self {
        self.strategy_order = order;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    fn set_phase(&self, phase: Phase) {
        tracing::debug!("Phase: {} -> {}", self.phase.get(), phase);
        self.phase.set(phase);
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn permission_gate(&self) -> PermissionGate<'_, P> {
        PermissionGate::new(&self.platform)
    }

    pub async fn create_space(&self) -> InvocationReport {
        let sink = NotificationSink::new(&self.platform);

        if self.phase.get() != Phase::Idle {
            tracing::info!("Ignoring trigger while {}", self.phase.get());
            sink.notify(CreateSpaceOutcome::Busy);
            return InvocationReport::short(CreateSpaceOutcome::Busy, TrustState::Unknown);
        }
        let _guard = PhaseGuard::enter(&self.phase);

        let gate = self.permission_gate();
        let trust = gate.check();
        if trust != TrustState::Granted {
            gate.show_guidance_if_denied(trust);
            sink.notify(CreateSpaceOutcome::PermissionDenied);
            return InvocationReport::short(CreateSpaceOutcome::PermissionDenied, trust);
        }

        self.set_phase(Phase::ResolvingDisplay);
        let target = DisplayResolver::new(&self.platform).resolve_target_display();
        tracing::info!(
            "Creating space on display {} ({}x{})",
            target.display.id,
            target.display.frame.width,
            target.display.frame.height
        );

        let chain = StrategyChain::new(&self.platform, self.timings)
            .with_order(self.strategy_order.clone());
        let attempts = chain
            .run(&target, |kind| self.set_phase(Phase::RunningStrategies(kind)))
            .await;

        let outcome = if attempts.iter().any(|(_, r)| r.is_success()) {
            CreateSpaceOutcome::Succeeded
        } else {
            let reasons: Vec<String> = attempts
                .iter()
                .map(|(kind, result)| match result {
                    AttemptResult::Failed(reason) => format!("{}: {}", kind, reason),
                    _ => format!("{}: not applicable", kind),
                })
                .collect();
            tracing::warn!("All strategies failed: [{}]", reasons.join("; "));
            CreateSpaceOutcome::AllStrategiesFailed
        };
        sink.notify(outcome);

        InvocationReport {
            outcome,
            trust,
            target: Some(target),
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::strategy::FailureReason;
    use crate::macos::{key_code, PermissionAlert, AX_ERROR_API_DISABLED};
    use crate::platform::mock::{create_test_display, Action, LogBuffer, MockPlatform, MockTree};

    fn orchestrator(platform: MockPlatform) -> Orchestrator<MockPlatform> {
        Orchestrator::new(platform, &Config::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_space_with_labelled_path() {
        let orch = orchestrator(MockPlatform::new());

        let report = orch.create_space().await;
        assert_eq!(report.outcome, CreateSpaceOutcome::Succeeded);
        assert_eq!(report.trust, TrustState::Granted);
        assert_eq!(
            report.attempts,
            vec![(StrategyKind::StructuralQuery, AttemptResult::Succeeded)]
        );
        assert_eq!(
            orch.platform().notifications(),
            vec![("Space Created".to_string(), "New desktop space added".to_string())]
        );
        assert_eq!(orch.phase(), Phase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_never_automates() {
        for trust in [Ok(false), Err(AX_ERROR_API_DISABLED)] {
            let orch = orchestrator(MockPlatform::new().with_trust(trust));

            let report = orch.create_space().await;
            assert_eq!(report.outcome, CreateSpaceOutcome::PermissionDenied);
            assert_eq!(report.trust, TrustState::Denied);
            assert!(report.target.is_none());
            assert!(report.attempts.is_empty());

            let platform = orch.platform();
            assert_eq!(platform.automation_count(), 0);
            assert!(platform.notifications().is_empty());
            assert_eq!(platform.alerts(), vec![PermissionAlert::Guidance]);
            assert_eq!(orch.phase(), Phase::Idle);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_targets_display_of_focused_window() {
        let platform = MockPlatform::new()
            .with_displays(vec![
                create_test_display(1, 0.0, 0.0, 800.0, 600.0),
                create_test_display(2, 800.0, 0.0, 800.0, 600.0),
            ])
            .with_focused_window(7, 100.0, 100.0)
            .with_tree(MockTree::mission_control(&[1, 2]));
        let orch = orchestrator(platform);

        let report = orch.create_space().await;
        assert_eq!(report.target.map(|t| t.display.id), Some(1));

        let tree = &orch.platform().tree;
        let first_container = tree.nodes[tree.find("mc").unwrap()].children[0];
        let bar = tree.nodes[first_container].children[0];
        let add = tree.nodes[bar].children[0];
        assert!(orch.platform().actions().contains(&Action::Press { node: add }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_strategies_failed() {
        let logs = LogBuffer::default();
        let _guard = logs.capture_warnings();

        let platform = MockPlatform::new()
            .with_unreachable_dock()
            .with_failing_input();
        let orch = orchestrator(platform);

        let report = orch.create_space().await;
        assert_eq!(report.outcome, CreateSpaceOutcome::AllStrategiesFailed);
        assert_eq!(
            report.attempts.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            StrategyKind::DECLARED_ORDER.to_vec()
        );
        assert!(matches!(
            report.attempts[0].1,
            AttemptResult::Failed(FailureReason::Unreachable { .. })
        ));
        assert!(matches!(
            report.attempts[1].1,
            AttemptResult::Failed(FailureReason::Unreachable { .. })
        ));
        assert!(matches!(
            report.attempts[2].1,
            AttemptResult::Failed(FailureReason::InputFailure(_))
        ));
        assert!(orch.platform().notifications().is_empty());
        assert_eq!(orch.phase(), Phase::Idle);

        let output = logs.contents();
        let positions: Vec<usize> = StrategyKind::DECLARED_ORDER
            .iter()
            .map(|kind| {
                let line = format!("Strategy {} failed:", kind);
                output
                    .find(&line)
                    .unwrap_or_else(|| panic!("missing {:?} in {}", line, output))
            })
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", output);

        let summary_start = output.find("All strategies failed: [").expect("summary logged");
        let summary = &output[summary_start..];
        let summary = &summary[..summary.find('\n').unwrap_or(summary.len())];
        let in_summary: Vec<usize> = StrategyKind::DECLARED_ORDER
            .iter()
            .map(|kind| summary.find(&format!("{}: ", kind)).expect("kind in summary"))
            .collect();
        assert!(in_summary.windows(2).all(|w| w[0] < w[1]), "{}", summary);
        assert!(summary_start > positions[2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_run_dismisses_overview_each_time() {
        let orch = orchestrator(MockPlatform::new().without_dock())
            .with_strategy_order(vec![StrategyKind::StructuralQuery, StrategyKind::StructuralScan]);

        let report = orch.create_space().await;
        assert_eq!(report.outcome, CreateSpaceOutcome::AllStrategiesFailed);

        let escapes = orch
            .platform()
            .actions()
            .iter()
            .filter(|a| {
                matches!(
                    a,
                    Action::KeyChord {
                        key_code: key_code::ESCAPE,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(escapes, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_trigger_is_busy() {
        let orch = orchestrator(MockPlatform::new());

        let (first, second) = tokio::join!(orch.create_space(), orch.create_space());
        assert_eq!(first.outcome, CreateSpaceOutcome::Succeeded);
        assert_eq!(second.outcome, CreateSpaceOutcome::Busy);
        assert!(second.attempts.is_empty());
        assert_eq!(orch.platform().notifications().len(), 1);

        // Next trigger after the first finished runs normally
        let third = orch.create_space().await;
        assert_eq!(third.outcome, CreateSpaceOutcome::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_visible_while_running() {
        let orch = orchestrator(MockPlatform::new());

        let observe = async {
            tokio::task::yield_now().await;
            orch.phase()
        };
        let (_, seen) = tokio::join!(orch.create_space(), observe);
        assert_eq!(seen, Phase::RunningStrategies(StrategyKind::StructuralQuery));
        assert_eq!(orch.phase(), Phase::Idle);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Idle.to_string(), "idle");
        assert_eq!(
            Phase::RunningStrategies(StrategyKind::StructuralScan).to_string(),
            "running-strategies(structural-scan)"
        );
    }
}
