//! Application state and its reducer
//!
//! [`AppState`] is a value; every change goes through [`reduce`], which
//! consumes the old state and an [`Action`] and returns the new state.
//! Samples are held behind `Arc` so cloning a state is cheap.
//!
//! The `revision` counter increases on every change that can alter analysis
//! results (samples, selection, analysis settings, gates), which is what
//! [`crate::analysis::AnalysisCache`] keys on.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crossize_gating::{Gate, GateSet};
use crossize_stats::SignificanceLevel;

use crate::comparison::ComparisonResult;
use crate::config::Settings;
use crate::sample::{Instrument, Sample};

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Transient message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
}

/// State changes
#[derive(Debug, Clone)]
pub enum Action {
    /// Add or replace a sample; the first sample of each instrument is
    /// selected automatically
    LoadSample(Sample),
    SelectFcs(String),
    SelectNta(String),
    /// Discard samples, selections, gates, and the last comparison
    ResetTab,
    SetAlpha(f64),
    SetKdePoints(usize),
    ReplaceSettings(Settings),
    AddGate(Gate),
    RemoveGate(Uuid),
    ToggleGate(Uuid),
    /// Backend comparison arrived
    ComparisonLoaded(ComparisonResult),
    /// A backend request failed; only a notification is added
    RequestFailed(String),
    DismissNotification(u64),
}

impl Action {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Action::LoadSample(_) => "load_sample",
            Action::SelectFcs(_) => "select_fcs",
            Action::SelectNta(_) => "select_nta",
            Action::ResetTab => "reset_tab",
            Action::SetAlpha(_) => "set_alpha",
            Action::SetKdePoints(_) => "set_kde_points",
            Action::ReplaceSettings(_) => "replace_settings",
            Action::AddGate(_) => "add_gate",
            Action::RemoveGate(_) => "remove_gate",
            Action::ToggleGate(_) => "toggle_gate",
            Action::ComparisonLoaded(_) => "comparison_loaded",
            Action::RequestFailed(_) => "request_failed",
            Action::DismissNotification(_) => "dismiss_notification",
        }
    }
}

/// Everything the application holds between user actions
#[derive(Debug, Clone, Default)]
pub struct AppState {
    samples: BTreeMap<String, Arc<Sample>>,
    selected_fcs: Option<String>,
    selected_nta: Option<String>,
    settings: Settings,
    gates: GateSet,
    last_comparison: Option<ComparisonResult>,
    notifications: Vec<Notification>,
    next_notification_id: u64,
    revision: u64,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn sample(&self, id: &str) -> Option<&Arc<Sample>> {
        self.samples.get(id)
    }

    /// Samples in id order
    pub fn samples(&self) -> impl Iterator<Item = &Arc<Sample>> {
        self.samples.values()
    }

    pub fn samples_of(&self, instrument: Instrument) -> impl Iterator<Item = &Arc<Sample>> {
        self.samples
            .values()
            .filter(move |s| s.instrument() == instrument)
    }

    pub fn selected_fcs_id(&self) -> Option<&str> {
        self.selected_fcs.as_deref()
    }

    pub fn selected_nta_id(&self) -> Option<&str> {
        self.selected_nta.as_deref()
    }

    pub fn selected_fcs(&self) -> Option<&Arc<Sample>> {
        self.selected_fcs.as_deref().and_then(|id| self.samples.get(id))
    }

    pub fn selected_nta(&self) -> Option<&Arc<Sample>> {
        self.selected_nta.as_deref().and_then(|id| self.samples.get(id))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn gates(&self) -> &GateSet {
        &self.gates
    }

    /// Last backend comparison, if it is for the current selection
    pub fn current_comparison(&self) -> Option<&ComparisonResult> {
        let (fcs, nta) = (self.selected_fcs.as_deref()?, self.selected_nta.as_deref()?);
        self.last_comparison.as_ref().filter(|c| c.matches(fcs, nta))
    }

    pub fn last_comparison(&self) -> Option<&ComparisonResult> {
        self.last_comparison.as_ref()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) {
        self.revision += 1;
    }

    fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        let id = self.next_notification_id;
        self.next_notification_id += 1;
        self.notifications.push(Notification {
            id,
            level,
            message: message.into(),
        });
    }

    fn slot_mut(&mut self, instrument: Instrument) -> &mut Option<String> {
        match instrument {
            Instrument::Fcs => &mut self.selected_fcs,
            Instrument::Nta => &mut self.selected_nta,
        }
    }

    /// Fill `instrument`'s slot with its first sample in id order, if any
    fn select_first(&mut self, instrument: Instrument) {
        let first = self.samples_of(instrument).next().map(|s| s.id().to_string());
        *self.slot_mut(instrument) = first;
    }

    fn select(&mut self, instrument: Instrument, id: String) {
        match self.samples.get(&id) {
            Some(sample) if sample.instrument() == instrument => {
                let slot = self.slot_mut(instrument);
                if slot.as_deref() != Some(id.as_str()) {
                    *slot = Some(id);
                    self.bump();
                }
            }
            Some(_) => self.notify(
                NotificationLevel::Error,
                format!("Sample {id} is not an {instrument} sample"),
            ),
            None => self.notify(NotificationLevel::Error, format!("Unknown sample: {id}")),
        }
    }
}

/// Apply one action
pub fn reduce(mut state: AppState, action: Action) -> AppState {
    tracing::debug!(action = action.name(), revision = state.revision, "reduce");

    match action {
        Action::LoadSample(sample) => {
            let id = sample.id().to_string();
            let instrument = sample.instrument();
            let replaced = state.samples.insert(id.clone(), Arc::new(sample));

            // A replacement from the other instrument leaves its old slot
            if let Some(old) = replaced.filter(|old| old.instrument() != instrument) {
                let old_slot = state.slot_mut(old.instrument());
                if old_slot.as_deref() == Some(id.as_str()) {
                    *old_slot = None;
                    state.select_first(old.instrument());
                }
            }

            let slot = state.slot_mut(instrument);
            if slot.is_none() {
                *slot = Some(id);
            }
            state.bump();
        }

        Action::SelectFcs(id) => state.select(Instrument::Fcs, id),
        Action::SelectNta(id) => state.select(Instrument::Nta, id),

        Action::ResetTab => {
            state.samples.clear();
            state.selected_fcs = None;
            state.selected_nta = None;
            state.gates = GateSet::new();
            state.last_comparison = None;
            state.bump();
        }

        Action::SetAlpha(alpha) => match SignificanceLevel::from_alpha(alpha) {
            Ok(level) => {
                state.settings.analysis.alpha = level.alpha();
                state.bump();
            }
            Err(e) => state.notify(NotificationLevel::Error, e.to_string()),
        },

        Action::SetKdePoints(points) => {
            if points < 2 {
                state.notify(
                    NotificationLevel::Error,
                    format!("KDE needs at least 2 points, got {points}"),
                );
            } else {
                state.settings.analysis.kde_points = points;
                state.bump();
            }
        }

        Action::ReplaceSettings(settings) => match settings.validate() {
            Ok(()) => {
                state.settings = settings;
                state.bump();
            }
            Err(e) => state.notify(NotificationLevel::Error, e.to_string()),
        },

        Action::AddGate(gate) => {
            state.gates.add(gate);
            state.bump();
        }

        Action::RemoveGate(id) => match state.gates.remove(id) {
            Ok(_) => state.bump(),
            Err(e) => state.notify(NotificationLevel::Error, e.to_string()),
        },

        Action::ToggleGate(id) => match state.gates.toggle(id) {
            Ok(_) => state.bump(),
            Err(e) => state.notify(NotificationLevel::Error, e.to_string()),
        },

        Action::ComparisonLoaded(result) => {
            state.last_comparison = Some(result);
        }

        Action::RequestFailed(message) => {
            tracing::warn!(%message, "Backend request failed");
            state.notify(NotificationLevel::Error, message);
        }

        Action::DismissNotification(id) => {
            state.notifications.retain(|n| n.id != id);
        }
    }

    state
}

/// Apply actions in order
pub fn reduce_all(state: AppState, actions: impl IntoIterator<Item = Action>) -> AppState {
    actions.into_iter().fold(state, reduce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::{MetricComparison, Verdict};
    use crate::distribution::SizeDistribution;
    use chrono::Utc;
    use crossize_gating::GateShape;
    use crossize_io::EventTable;

    fn fcs(id: &str) -> Sample {
        let table = EventTable::new(vec!["size".into()], vec![vec![90.0, 100.0, 110.0]]).unwrap();
        Sample::from_events(id, Instrument::Fcs, table, None).unwrap()
    }

    fn nta(id: &str) -> Sample {
        let dist = SizeDistribution::from_parallel(vec![90.0, 110.0], vec![1.0, 1.0]).unwrap();
        Sample::from_distribution(id, Instrument::Nta, dist)
    }

    fn loaded() -> AppState {
        reduce_all(
            AppState::default(),
            [
                Action::LoadSample(fcs("f1")),
                Action::LoadSample(fcs("f2")),
                Action::LoadSample(nta("n1")),
            ],
        )
    }

    #[test]
    fn test_first_sample_auto_selected() {
        let state = loaded();
        assert_eq!(state.selected_fcs_id(), Some("f1"));
        assert_eq!(state.selected_nta_id(), Some("n1"));
        assert_eq!(state.samples().count(), 3);
        assert_eq!(state.samples_of(Instrument::Fcs).count(), 2);
        assert_eq!(state.revision(), 3);
    }

    #[test]
    fn test_replacing_with_other_instrument_moves_selection() {
        let state = reduce(AppState::default(), Action::LoadSample(fcs("x")));
        assert_eq!(state.selected_fcs_id(), Some("x"));

        let state = reduce(state, Action::LoadSample(nta("x")));
        assert_eq!(state.selected_fcs_id(), None);
        assert_eq!(state.selected_nta_id(), Some("x"));
        assert!(state.selected_fcs().is_none());
        assert_eq!(state.samples().count(), 1);
    }

    #[test]
    fn test_replaced_selection_falls_back_to_next_sample() {
        let state = reduce(loaded(), Action::LoadSample(nta("f1")));
        assert_eq!(state.selected_fcs_id(), Some("f2"));
        // n1 stays selected; f1 is now an NTA sample but not the selection
        assert_eq!(state.selected_nta_id(), Some("n1"));
        assert_eq!(state.selected_fcs().unwrap().instrument(), Instrument::Fcs);
    }

    #[test]
    fn test_select_bumps_revision_once() {
        let state = loaded();
        let state = reduce(state, Action::SelectFcs("f2".into()));
        assert_eq!(state.selected_fcs_id(), Some("f2"));
        assert_eq!(state.revision(), 4);

        let state = reduce(state, Action::SelectFcs("f2".into()));
        assert_eq!(state.revision(), 4);
    }

    #[test]
    fn test_select_wrong_instrument_notifies() {
        let state = reduce(loaded(), Action::SelectFcs("n1".into()));
        assert_eq!(state.selected_fcs_id(), Some("f1"));
        assert_eq!(state.notifications().len(), 1);
        assert_eq!(state.notifications()[0].level, NotificationLevel::Error);

        let state = reduce(state, Action::SelectNta("missing".into()));
        assert_eq!(state.notifications().len(), 2);
    }

    #[test]
    fn test_request_failed_leaves_state_untouched() {
        let before = loaded();
        let after = reduce(before.clone(), Action::RequestFailed("timeout".into()));
        assert_eq!(after.revision(), before.revision());
        assert_eq!(after.selected_fcs_id(), before.selected_fcs_id());
        assert_eq!(after.samples().count(), before.samples().count());
        assert_eq!(after.notifications()[0].message, "timeout");

        let id = after.notifications()[0].id;
        let after = reduce(after, Action::DismissNotification(id));
        assert!(after.notifications().is_empty());
    }

    #[test]
    fn test_reset_tab_clears_samples() {
        let state = reduce(
            loaded(),
            Action::AddGate(Gate::new("P1", GateShape::rectangle(0.0, 1.0, 0.0, 1.0), "x", "y").unwrap()),
        );
        let settings = state.settings().clone();
        let state = reduce(state, Action::ResetTab);
        assert_eq!(state.samples().count(), 0);
        assert!(state.selected_fcs().is_none());
        assert!(state.gates().is_empty());
        assert_eq!(state.settings(), &settings);
    }

    #[test]
    fn test_set_alpha_validates() {
        let state = reduce(AppState::default(), Action::SetAlpha(0.01));
        assert_eq!(state.settings().analysis.alpha, 0.01);
        assert_eq!(state.revision(), 1);

        let state = reduce(state, Action::SetAlpha(2.0));
        assert_eq!(state.settings().analysis.alpha, 0.01);
        assert_eq!(state.revision(), 1);
        assert_eq!(state.notifications().len(), 1);
    }

    #[test]
    fn test_set_kde_points() {
        let state = reduce(AppState::default(), Action::SetKdePoints(256));
        assert_eq!(state.settings().analysis.kde_points, 256);
        let state = reduce(state, Action::SetKdePoints(1));
        assert_eq!(state.settings().analysis.kde_points, 256);
    }

    #[test]
    fn test_gate_actions() {
        let gate = Gate::new("P1", GateShape::rectangle(0.0, 1.0, 0.0, 1.0), "x", "y").unwrap();
        let id = gate.id;
        let state = reduce(AppState::default(), Action::AddGate(gate));
        let state = reduce(state, Action::ToggleGate(id));
        assert!(!state.gates().get(id).unwrap().active);

        let state = reduce(state, Action::RemoveGate(id));
        assert!(state.gates().is_empty());
        assert_eq!(state.revision(), 3);

        let state = reduce(state, Action::RemoveGate(id));
        assert_eq!(state.notifications().len(), 1);
        assert_eq!(state.revision(), 3);
    }

    #[test]
    fn test_comparison_matches_selection() {
        let result = ComparisonResult {
            fcs_sample_id: "f1".into(),
            nta_sample_id: "n1".into(),
            metrics: vec![MetricComparison::resolve("d50", 100.0, 100.0, None)],
            verdict: Verdict::Pass,
            summary: None,
            received_at: Utc::now(),
        };
        let state = reduce(loaded(), Action::ComparisonLoaded(result));
        assert_eq!(state.current_comparison().unwrap().verdict, Verdict::Pass);
        assert_eq!(state.revision(), 3);

        let state = reduce(state, Action::SelectFcs("f2".into()));
        assert!(state.current_comparison().is_none());
        assert!(state.last_comparison().is_some());
    }
}
