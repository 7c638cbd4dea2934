//! Top-level dashboard state and the transitions that change it. Views only
//! read `DashboardState`; every change goes through `dispatch`.

use std::cell::{Ref, RefCell};

use chrono::{DateTime, Utc};

use crate::data::{CitationSource, FetchOutcome, Incident};
use crate::error::FetchError;

pub const FETCH_ERROR_MESSAGE: &str =
    "Failed to fetch maritime disruption data. Please check your API key and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

#[derive(Debug)]
pub enum Action {
    /// Sent once when the window comes up.
    Start,
    Refresh,
    FetchFinished(Result<FetchOutcome, FetchError>),
    Select(Option<String>),
    DismissError,
}

/// Work the caller must perform after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    StartFetch,
}

#[derive(Debug, Default)]
pub struct DashboardState {
    pub phase: Phase,
    pub incidents: Vec<Incident>,
    pub sources: Vec<CitationSource>,
    pub selected: Option<String>,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl DashboardState {
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn selected_incident(&self) -> Option<&Incident> {
        let id = self.selected.as_deref()?;
        self.incidents.iter().find(|incident| incident.id == id)
    }

    pub fn dispatch(&mut self, action: Action) -> Option<Effect> {
        match action {
            Action::Start => {
                if self.phase != Phase::Idle {
                    return None;
                }
                self.begin_loading()
            }
            Action::Refresh => match self.phase {
                Phase::Ready | Phase::Error => self.begin_loading(),
                Phase::Loading => {
                    log::debug!("Refresh ignored, fetch already in flight");
                    None
                }
                Phase::Idle => None,
            },
            Action::FetchFinished(result) => {
                if self.phase != Phase::Loading {
                    log::warn!("Dropping fetch result that arrived while {:?}", self.phase);
                    return None;
                }
                self.finish_loading(result);
                None
            }
            Action::Select(id) => {
                self.select(id);
                None
            }
            Action::DismissError => {
                self.error = None;
                None
            }
        }
    }

    fn begin_loading(&mut self) -> Option<Effect> {
        self.phase = Phase::Loading;
        self.error = None;
        Some(Effect::StartFetch)
    }

    fn finish_loading(&mut self, result: Result<FetchOutcome, FetchError>) {
        match result {
            Ok(outcome) => {
                self.incidents = outcome.incidents;
                self.sources = outcome.sources;
                self.last_updated = Some(Utc::now());
                self.phase = Phase::Ready;
                if self.selected_incident().is_none() {
                    self.selected = None;
                }
            }
            Err(e) => {
                log::error!("Fetch failed: {e}");
                self.error = Some(FETCH_ERROR_MESSAGE.to_string());
                self.phase = Phase::Error;
            }
        }
    }

    fn select(&mut self, id: Option<String>) {
        match id {
            None => self.selected = None,
            Some(id) if self.incidents.iter().any(|incident| incident.id == id) => {
                self.selected = Some(id);
            }
            Some(id) => log::debug!("Ignoring selection of unknown incident {id}"),
        }
    }
}

type Observer = Box<dyn Fn(&DashboardState)>;

/// Single owner of the dashboard state on the UI thread. Observers are
/// re-run after every dispatch.
#[derive(Default)]
pub struct Store {
    state: RefCell<DashboardState>,
    observers: RefCell<Vec<Observer>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Ref<'_, DashboardState> {
        self.state.borrow()
    }

    pub fn subscribe(&self, observer: impl Fn(&DashboardState) + 'static) {
        self.observers.borrow_mut().push(Box::new(observer));
    }

    pub fn dispatch(&self, action: Action) -> Option<Effect> {
        let effect = self.state.borrow_mut().dispatch(action);
        let state = self.state.borrow();
        for observer in self.observers.borrow().iter() {
            observer(&state);
        }
        effect
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::data::{Category, Coordinates, Severity};

    fn incident(id: &str) -> Incident {
        Incident {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            severity: Severity::Medium,
            category: Category::Other,
            location_name: String::new(),
            coordinates: Coordinates::ORIGIN,
            date: "2025-01-01".to_string(),
            sources: Vec::new(),
        }
    }

    fn outcome(ids: &[&str]) -> FetchOutcome {
        FetchOutcome {
            incidents: ids.iter().map(|id| incident(id)).collect(),
            sources: Vec::new(),
        }
    }

    fn network_error() -> FetchError {
        FetchError::Status {
            status: 503,
            message: "unavailable".to_string(),
        }
    }

    #[test]
    fn start_fires_once() {
        let mut state = DashboardState::default();
        assert_eq!(state.dispatch(Action::Start), Some(Effect::StartFetch));
        assert_eq!(state.phase, Phase::Loading);
        assert_eq!(state.dispatch(Action::Start), None);
    }

    #[test]
    fn refresh_is_ignored_while_loading() {
        let mut state = DashboardState::default();
        state.dispatch(Action::Start);
        assert_eq!(state.dispatch(Action::Refresh), None);
        assert_eq!(state.phase, Phase::Loading);
    }

    #[test]
    fn success_replaces_data_wholesale() {
        let mut state = DashboardState::default();
        state.dispatch(Action::Start);
        state.dispatch(Action::FetchFinished(Ok(outcome(&["a", "b"]))));
        assert_eq!(state.phase, Phase::Ready);
        assert!(state.last_updated.is_some());

        assert_eq!(state.dispatch(Action::Refresh), Some(Effect::StartFetch));
        state.dispatch(Action::FetchFinished(Ok(outcome(&["c"]))));
        let ids: Vec<&str> = state.incidents.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
    }

    #[test]
    fn failure_keeps_previous_data_and_raises_banner() {
        let mut state = DashboardState::default();
        state.dispatch(Action::Start);
        state.dispatch(Action::FetchFinished(Ok(outcome(&["a"]))));
        let updated = state.last_updated;

        state.dispatch(Action::Refresh);
        state.dispatch(Action::FetchFinished(Err(network_error())));

        assert_eq!(state.phase, Phase::Error);
        assert!(!state.is_loading());
        assert_eq!(state.incidents.len(), 1);
        assert_eq!(state.last_updated, updated);
        assert_eq!(state.error.as_deref(), Some(FETCH_ERROR_MESSAGE));

        state.dispatch(Action::DismissError);
        assert_eq!(state.error, None);
        assert_eq!(state.incidents.len(), 1);
    }

    #[test]
    fn first_load_failure_leaves_state_empty() {
        let mut state = DashboardState::default();
        state.dispatch(Action::Start);
        state.dispatch(Action::FetchFinished(Err(FetchError::MissingApiKey)));
        assert!(state.incidents.is_empty());
        assert_eq!(state.phase, Phase::Error);
        assert_eq!(state.dispatch(Action::Refresh), Some(Effect::StartFetch));
        assert_eq!(state.error, None);
    }

    #[test]
    fn lost_fetch_task_ends_loading_and_allows_refresh() {
        let (tx, rx) = flume::bounded::<Result<FetchOutcome, FetchError>>(1);
        drop(tx);
        let lost = rx.recv().unwrap_err();

        let mut state = DashboardState::default();
        state.dispatch(Action::Start);
        state.dispatch(Action::FetchFinished(Err(lost.into())));

        assert!(!state.is_loading());
        assert_eq!(state.error.as_deref(), Some(FETCH_ERROR_MESSAGE));
        assert_eq!(state.dispatch(Action::Refresh), Some(Effect::StartFetch));
    }

    #[test]
    fn selecting_unknown_id_is_a_noop() {
        let mut state = DashboardState::default();
        state.dispatch(Action::Start);
        state.dispatch(Action::FetchFinished(Ok(outcome(&["a", "b"]))));

        state.dispatch(Action::Select(Some("zzz".to_string())));
        assert_eq!(state.selected, None);

        state.dispatch(Action::Select(Some("b".to_string())));
        state.dispatch(Action::Select(Some("zzz".to_string())));
        assert_eq!(state.selected.as_deref(), Some("b"));

        state.dispatch(Action::Select(None));
        assert_eq!(state.selected, None);
    }

    #[test]
    fn refetch_clears_selection_that_disappeared() {
        let mut state = DashboardState::default();
        state.dispatch(Action::Start);
        state.dispatch(Action::FetchFinished(Ok(outcome(&["a", "b"]))));
        state.dispatch(Action::Select(Some("b".to_string())));

        state.dispatch(Action::Refresh);
        state.dispatch(Action::FetchFinished(Ok(outcome(&["b", "c"]))));
        assert_eq!(state.selected.as_deref(), Some("b"));

        state.dispatch(Action::Refresh);
        state.dispatch(Action::FetchFinished(Ok(outcome(&["c"]))));
        assert_eq!(state.selected, None);
    }

    #[test]
    fn stray_result_outside_loading_is_dropped() {
        let mut state = DashboardState::default();
        state.dispatch(Action::FetchFinished(Ok(outcome(&["a"]))));
        assert!(state.incidents.is_empty());
        assert_eq!(state.phase, Phase::Idle);
    }

    #[test]
    fn store_notifies_observers_after_each_dispatch() {
        let store = Store::new();
        let calls = Rc::new(Cell::new(0));
        let seen_loading = Rc::new(Cell::new(false));

        let calls_clone = calls.clone();
        let seen_loading_clone = seen_loading.clone();
        store.subscribe(move |state| {
            calls_clone.set(calls_clone.get() + 1);
            seen_loading_clone.set(state.is_loading());
        });

        assert_eq!(store.dispatch(Action::Start), Some(Effect::StartFetch));
        assert!(seen_loading.get());
        store.dispatch(Action::FetchFinished(Ok(outcome(&["a"]))));
        assert!(!seen_loading.get());
        assert_eq!(calls.get(), 2);
        assert_eq!(store.state().incidents.len(), 1);
    }
}
