//! Navigation state for an ordered sequence of form steps.
//!
//! A [`Stepper`] tracks the active step, per-step completion flags and the
//! navigation policy. Requests that are out of range or not allowed by the
//! policy are dropped and reported as `false`; navigation never fails.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessibilityMode {
    /// Back navigation is always allowed; forward jumps need the previous
    /// step completed.
    #[default]
    Free,
    /// No back navigation; jumps only to the step right after the active one.
    ForwardOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDescriptor {
    pub index: usize,
    pub label: String,
}

impl StepDescriptor {
    pub fn new(index: usize, label: impl Into<String>) -> Self {
        Self {
            index,
            label: label.into(),
        }
    }

    fn unlabeled(index: usize) -> Self {
        Self::new(index, format!("Step {}", index + 1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorState {
    Active,
    Completed,
    Accessible,
    Inaccessible,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicator {
    pub index: usize,
    pub label: String,
    pub state: IndicatorState,
    pub accessible: bool,
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let number = self.index + 1;
        match self.state {
            IndicatorState::Active => write!(f, "[>{number} {}<]", self.label),
            IndicatorState::Completed => write!(f, "[✓{number} {}]", self.label),
            IndicatorState::Accessible => write!(f, "[ {number} {}]", self.label),
            IndicatorState::Inaccessible => write!(f, "[·{number} {}]", self.label),
        }
    }
}

/// Enablement of the previous/next buttons under the step content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavigationBar {
    pub previous_enabled: bool,
    pub next_enabled: bool,
    pub next_caption: &'static str,
}

/// Snapshot of the navigation position taken before an async call.
///
/// The lease stays current until the active step changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepLease {
    step: usize,
    epoch: u64,
}

impl StepLease {
    pub fn step(&self) -> usize {
        self.step
    }
}

#[derive(Debug, Clone, Default)]
pub struct Stepper {
    steps: Vec<StepDescriptor>,
    active_step: usize,
    completed: BTreeMap<usize, bool>,
    mode: AccessibilityMode,
    epoch: u64,
}

impl Stepper {
    pub fn new(mode: AccessibilityMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Registers `labels` as steps `0..labels.len()` up front.
    pub fn with_steps<I, L>(labels: I, mode: AccessibilityMode) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        let mut stepper = Self::new(mode);
        for (index, label) in labels.into_iter().enumerate() {
            stepper.register_labeled_step(index, label);
        }
        stepper
    }

    pub fn with_default_step(mut self, step: usize) -> Self {
        self.active_step = step;
        self.clamp_active_step();
        self
    }

    /// Adds `index` to the registered set. Repeated calls are no-ops.
    pub fn register_step(&mut self, index: usize) {
        if let Err(position) = self.position_of(index) {
            self.steps.insert(position, StepDescriptor::unlabeled(index));
            self.clamp_active_step();
        }
    }

    /// Adds `index` or replaces the label of an already registered step.
    pub fn register_labeled_step(&mut self, index: usize, label: impl Into<String>) {
        match self.position_of(index) {
            Ok(position) => {
                if let Some(step) = self.steps.get_mut(position) {
                    step.label = label.into();
                }
            }
            Err(position) => {
                self.steps.insert(position, StepDescriptor::new(index, label));
                self.clamp_active_step();
            }
        }
    }

    fn position_of(&self, index: usize) -> Result<usize, usize> {
        self.steps.binary_search_by_key(&index, |step| step.index)
    }

    fn clamp_active_step(&mut self) {
        if let Some(last) = self.step_count().checked_sub(1) {
            self.active_step = self.active_step.min(last);
        }
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn registered_indices(&self) -> Vec<usize> {
        self.steps.iter().map(|step| step.index).collect()
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn active_step(&self) -> usize {
        self.active_step
    }

    pub fn mode(&self) -> AccessibilityMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AccessibilityMode) {
        self.mode = mode;
    }

    pub fn is_first_step(&self) -> bool {
        self.active_step == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.step_count()
            .checked_sub(1)
            .is_some_and(|last| self.active_step == last)
    }

    pub fn is_step_completed(&self, index: usize) -> bool {
        self.completed.get(&index).copied().unwrap_or(false)
    }

    /// Records the flag without navigating.
    pub fn set_step_completed(&mut self, index: usize, completed: bool) {
        self.completed.insert(index, completed);
    }

    /// Advances one step. Does not consult completion flags.
    pub fn next_step(&mut self) -> bool {
        let Some(last) = self.step_count().checked_sub(1) else {
            debug!("stepper: next_step ignored, no steps registered");
            return false;
        };
        if self.active_step >= last {
            debug!(active_step = self.active_step, "stepper: next_step ignored at last step");
            return false;
        }
        self.move_to((self.active_step + 1).min(last));
        true
    }

    pub fn prev_step(&mut self) -> bool {
        if self.mode == AccessibilityMode::ForwardOnly {
            debug!("stepper: prev_step ignored in forward-only mode");
            return false;
        }
        if self.active_step == 0 {
            return false;
        }
        self.move_to(self.active_step - 1);
        true
    }

    /// Whether `go_to_step(target)` would be honoured right now.
    pub fn can_go_to(&self, target: usize) -> bool {
        if target >= self.step_count() {
            return false;
        }
        match self.mode {
            AccessibilityMode::Free => {
                target == 0
                    || target < self.active_step
                    || self.is_step_completed(target - 1)
            }
            AccessibilityMode::ForwardOnly => target == self.active_step + 1,
        }
    }

    pub fn go_to_step(&mut self, target: usize) -> bool {
        if !self.can_go_to(target) {
            debug!(
                target,
                active_step = self.active_step,
                mode = ?self.mode,
                "stepper: go_to_step rejected"
            );
            return false;
        }
        if target != self.active_step {
            self.move_to(target);
        }
        true
    }

    fn move_to(&mut self, step: usize) {
        self.active_step = step;
        self.epoch += 1;
    }

    pub fn indicators(&self) -> Vec<Indicator> {
        self.steps
            .iter()
            .enumerate()
            .map(|(position, step)| {
                let accessible = self.can_go_to(position);
                let state = if position == self.active_step {
                    IndicatorState::Active
                } else if self.is_step_completed(step.index) {
                    IndicatorState::Completed
                } else if accessible {
                    IndicatorState::Accessible
                } else {
                    IndicatorState::Inaccessible
                };
                Indicator {
                    index: step.index,
                    label: step.label.clone(),
                    state,
                    accessible,
                }
            })
            .collect()
    }

    /// Indicator click: navigates only when the indicator is accessible.
    pub fn click_indicator(&mut self, index: usize) -> bool {
        self.can_go_to(index) && self.go_to_step(index)
    }

    pub fn navigation_bar(&self) -> NavigationBar {
        NavigationBar {
            previous_enabled: !self.is_first_step() && self.mode == AccessibilityMode::Free,
            next_enabled: self.is_step_completed(self.active_step),
            next_caption: if self.is_last_step() {
                "Complete Registration"
            } else {
                "Next"
            },
        }
    }

    pub fn lease(&self) -> StepLease {
        StepLease {
            step: self.active_step,
            epoch: self.epoch,
        }
    }

    pub fn is_lease_current(&self, lease: &StepLease) -> bool {
        lease.epoch == self.epoch && lease.step == self.active_step
    }

    pub fn step_title(&self, index: usize) -> Option<String> {
        self.steps
            .get(index)
            .map(|step| format!("STEP {}: {}", index + 1, step.label.to_uppercase()))
    }

    pub fn active_title(&self) -> Option<String> {
        self.step_title(self.active_step)
    }

    pub fn render_strip(&self) -> String {
        self.indicators()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ─ ")
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
