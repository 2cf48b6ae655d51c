// Session State - everything one user interaction session owns
// All mutation goes through the named actions: set_input, submit, start_over

use serde::Serialize;
use std::collections::BTreeSet;

use crate::router::{Panel, RequestRouter, RouteOutcome};

/// Whole-application state machine. Derived from the active panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Screen {
    Idle,
    ViewForm,
    S3Form,
    ApiForm,
    ViewHistory,
    ApiHistory,
}

impl From<Option<Panel>> for Screen {
    fn from(panel: Option<Panel>) -> Self {
        match panel {
            None => Screen::Idle,
            Some(Panel::ViewForm) => Screen::ViewForm,
            Some(Panel::S3Form) => Screen::S3Form,
            Some(Panel::ApiForm) => Screen::ApiForm,
            Some(Panel::ViewHistory) => Screen::ViewHistory,
            Some(Panel::ApiHistory) => Screen::ApiHistory,
        }
    }
}

/// One request/answer pair. Keeping them together means the two logs
/// can never drift to different lengths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exchange {
    pub request: String,
    pub response: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    active_panel: Option<Panel>,
    exchanges: Vec<Exchange>,
    preselected: BTreeSet<String>,
    input_text: String,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // ACTIONS
    // ========================================================================

    /// Replace the text of the input box
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input_text = text.into();
    }

    /// Submit the current input text.
    ///
    /// Empty input is a no-op and returns `None`. Otherwise the previous
    /// panel and pre-selection are cleared before the new match is applied.
    pub fn submit(&mut self, router: &RequestRouter) -> Option<RouteOutcome> {
        if self.input_text.is_empty() {
            return None;
        }
        self.active_panel = None;
        self.preselected.clear();

        let request = self.input_text.clone();
        let outcome = router.route(&request);

        self.exchanges.push(Exchange {
            request,
            response: outcome.response.clone(),
        });
        self.active_panel = outcome.panel;
        self.preselected = outcome.preselected.clone();

        Some(outcome)
    }

    /// Convenience: set the input and submit it
    pub fn ask(&mut self, router: &RequestRouter, text: impl Into<String>) -> Option<RouteOutcome> {
        self.set_input(text);
        self.submit(router)
    }

    /// Return to the initial empty state
    pub fn start_over(&mut self) {
        *self = Self::default();
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn screen(&self) -> Screen {
        Screen::from(self.active_panel)
    }

    pub fn active_panel(&self) -> Option<Panel> {
        self.active_panel
    }

    /// Per-panel visibility flag
    pub fn is_visible(&self, panel: Panel) -> bool {
        self.active_panel == Some(panel)
    }

    pub fn requests(&self) -> Vec<&str> {
        self.exchanges.iter().map(|e| e.request.as_str()).collect()
    }

    pub fn answers(&self) -> Vec<&str> {
        self.exchanges.iter().map(|e| e.response.as_str()).collect()
    }

    pub fn last_exchange(&self) -> Option<&Exchange> {
        self.exchanges.last()
    }

    pub fn preselected(&self) -> &BTreeSet<String> {
        &self.preselected
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::APOLOGY_RESPONSE;

    #[test]
    fn test_initial_state_is_idle() {
        let session = SessionState::new();
        assert_eq!(session.screen(), Screen::Idle);
        assert!(session.requests().is_empty());
        assert!(session.last_exchange().is_none());
    }

    #[test]
    fn test_submit_activates_single_panel() {
        let router = RequestRouter::new();
        let mut session = SessionState::new();

        session.ask(&router, "show me the history");
        assert_eq!(session.screen(), Screen::ViewHistory);

        session.ask(&router, "I want an s3 file");
        assert_eq!(session.screen(), Screen::S3Form);

        let visible: Vec<_> = Panel::ALL.iter().filter(|p| session.is_visible(**p)).collect();
        assert_eq!(visible, vec![&Panel::S3Form]);
    }

    #[test]
    fn test_unmatched_request_returns_to_idle() {
        let router = RequestRouter::new();
        let mut session = SessionState::new();

        session.ask(&router, "create a view");
        session.ask(&router, "make me lunch");

        assert_eq!(session.screen(), Screen::Idle);
        assert_eq!(session.last_exchange().unwrap().response, APOLOGY_RESPONSE);
    }

    #[test]
    fn test_empty_input_is_noop_for_logs() {
        let router = RequestRouter::new();
        let mut session = SessionState::new();

        assert!(session.ask(&router, "").is_none());
        assert!(session.requests().is_empty());
        assert!(session.answers().is_empty());
        assert_eq!(session.screen(), Screen::Idle);

        session.ask(&router, "rest api");
        session.ask(&router, "");
        assert_eq!(session.screen(), Screen::ApiForm);
        assert_eq!(session.requests().len(), 1);
    }

    #[test]
    fn test_logs_stay_parallel() {
        let router = RequestRouter::new();
        let mut session = SessionState::new();

        for text in ["history", "", "rest api", "lunch", "", "create a view", "s3 file"] {
            session.ask(&router, text);
            assert_eq!(session.requests().len(), session.answers().len());
        }
        assert_eq!(session.requests().len(), 5);
        assert_eq!(session.requests()[1], "rest api");
    }

    #[test]
    fn test_start_over_from_any_state() {
        let router = RequestRouter::new().with_preselection(true);

        for text in [
            "history of rest api",
            "history",
            "create a view of interest income",
            "s3 file",
            "rest api",
            "lunch",
        ] {
            let mut session = SessionState::new();
            session.ask(&router, text);
            session.start_over();
            assert_eq!(session, SessionState::new(), "{text}");
        }
    }

    #[test]
    fn test_submit_clears_previous_preselection() {
        let router = RequestRouter::new().with_preselection(true);
        let mut session = SessionState::new();

        session.ask(&router, "create a view of interest income");
        assert!(!session.preselected().is_empty());

        session.ask(&router, "show the history");
        assert!(session.preselected().is_empty());
    }
}
