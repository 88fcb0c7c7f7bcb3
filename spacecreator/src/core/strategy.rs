use core_graphics::geometry::CGPoint;
use thiserror::Error;
use tokio::time::sleep;

use crate::macos::{key_code, Modifiers};
use crate::platform::Platform;

use super::config::Timings;
use super::display::TargetDisplay;
use super::locate::{find_labelled_add_control, scan_for_add_control, OVERVIEW_HOST};

pub const DOCK_BUNDLE_ID: &str = "com.apple.dock";

/// Inset of the add control from the top-right corner of the display.
const ADD_CONTROL_INSET_RIGHT: f64 = 60.0;
const ADD_CONTROL_INSET_TOP: f64 = 25.0;

/// The closed set of ways to reach the overview's add control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Follow the labelled element path in the Dock.
    StructuralQuery,
    /// Scan sibling groups in the Dock for the first button.
    StructuralScan,
    /// Hover and click where the control is expected to be drawn.
    GeometricSynthesis,
}

impl StrategyKind {
    pub const DECLARED_ORDER: [StrategyKind; 3] = [
        StrategyKind::StructuralQuery,
        StrategyKind::StructuralScan,
        StrategyKind::GeometricSynthesis,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::StructuralQuery => "structural-query",
            StrategyKind::StructuralScan => "structural-scan",
            StrategyKind::GeometricSynthesis => "geometric-synthesis",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("no element matched {0}")]
    LookupFailure(String),
    #[error("{process} could not be queried: {detail}")]
    Unreachable { process: String, detail: String },
    #[error("input synthesis failed: {0}")]
    InputFailure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResult {
    Succeeded,
    Failed(FailureReason),
    NotApplicable,
}

impl AttemptResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptResult::Succeeded)
    }
}

/// Expected position of the add control on `target`, in top-left-origin
/// global coordinates.
pub fn add_control_point(target: &TargetDisplay) -> CGPoint {
    let frame = target.global_frame();
    CGPoint::new(
        frame.max_x() - ADD_CONTROL_INSET_RIGHT,
        frame.y + ADD_CONTROL_INSET_TOP,
    )
}

/// Runs strategies in order against one target display until one of them
/// activates the add control.
pub struct StrategyChain<'a, P> {
    platform: &'a P,
    timings: Timings,
    order: Vec<StrategyKind>,
}

impl<'a, P: Platform> StrategyChain<'a, P> {
    pub fn new(platform: &'a P, timings: Timings) -> Self {
        Self {
            platform,
            timings,
            order: StrategyKind::DECLARED_ORDER.to_vec(),
        }
    }

    pub fn with_order(mut self, order: Vec<StrategyKind>) -> Self {
        self.order = order;
        self
    }

    /// Attempt each strategy in turn. `observe` is called as each one starts.
    /// Returns every attempt made, ending at the first success.
    pub async fn run(
        &self,
        target: &TargetDisplay,
        mut observe: impl FnMut(StrategyKind),
    ) -> Vec<(StrategyKind, AttemptResult)> {
        let mut attempts = Vec::with_capacity(self.order.len());

        for (index, &kind) in self.order.iter().enumerate() {
            if index > 0 {
                sleep(self.timings.settle).await;
            }
            observe(kind);
            let result = self.attempt(kind, target).await;
            match &result {
                AttemptResult::Succeeded => tracing::info!("Strategy {} activated the add control", kind),
                AttemptResult::Failed(reason) => tracing::warn!("Strategy {} failed: {}", kind, reason),
                AttemptResult::NotApplicable => {
                    tracing::debug!("Strategy {} skipped for display {}", kind, target.display.id)
                }
            }
            let done = result.is_success();
            attempts.push((kind, result));
            if done {
                break;
            }
        }

        attempts
    }

    /// One full invoke, locate, activate, dismiss cycle.
    pub async fn attempt(&self, kind: StrategyKind, target: &TargetDisplay) -> AttemptResult {
        if kind == StrategyKind::GeometricSynthesis && target.display.frame.is_empty() {
            return AttemptResult::NotApplicable;
        }

        self.open_overview();
        sleep(self.timings.overview_open).await;

        let activated = match kind {
            StrategyKind::StructuralQuery => {
                self.press_located(|pid| find_labelled_add_control(self.platform, pid, target.display.id))
            }
            StrategyKind::StructuralScan => {
                self.press_located(|pid| scan_for_add_control(self.platform, pid))
            }
            StrategyKind::GeometricSynthesis => self.click_at(add_control_point(target)).await,
        };

        sleep(self.timings.settle).await;
        self.dismiss_overview();

        match activated {
            Ok(()) => AttemptResult::Succeeded,
            Err(reason) => AttemptResult::Failed(reason),
        }
    }

    fn open_overview(&self) {
        if let Err(e) = self
            .platform
            .post_key_chord(key_code::UP, Modifiers::CTRL)
        {
            tracing::warn!("Failed to open overview, continuing: {}", e);
        }
    }

    fn dismiss_overview(&self) {
        if let Err(e) = self
            .platform
            .post_key_chord(key_code::ESCAPE, Modifiers::NONE)
        {
            tracing::warn!("Failed to dismiss overview: {}", e);
        }
    }

    fn press_located<F>(&self, locate: F) -> Result<(), FailureReason>
    where
        F: FnOnce(i32) -> Result<P::Element, FailureReason>,
    {
        let pid = self
            .platform
            .pid_for_bundle_id(DOCK_BUNDLE_ID)
            .ok_or_else(|| FailureReason::Unreachable {
                process: OVERVIEW_HOST.to_string(),
                detail: "not running".to_string(),
            })?;
        let control = locate(pid)?;
        self.platform
            .press(&control)
            .map_err(|e| FailureReason::Unreachable {
                process: OVERVIEW_HOST.to_string(),
                detail: format!("press failed ({})", e),
            })
    }

    async fn click_at(&self, point: CGPoint) -> Result<(), FailureReason> {
        tracing::debug!("Hovering add control at ({}, {})", point.x, point.y);
        self.platform
            .move_pointer(point)
            .map_err(FailureReason::InputFailure)?;
        sleep(self.timings.control_reveal).await;
        self.platform
            .click(point)
            .map_err(FailureReason::InputFailure)
    }
}
