// 🖼️ Render - pure `render(state) -> PageView`
// Front-ends (TUI, HTML) only draw a PageView; they never look at SessionState directly.

use chrono::NaiveDate;
use serde::Serialize;

use crate::artifacts::Confirmation;
use crate::forms::{FormKind, FormView};
use crate::history::{HistoryKind, HistoryProvider, HistoryRecord};
use crate::router::Panel;
use crate::session::{Exchange, Screen, SessionState};

pub const PAGE_TITLE: &str = "Data Access AI Agent";
pub const INPUT_LABEL: &str = "Ask the AI agent to create a data access view or file:";
pub const START_OVER_LABEL: &str = "Start Over";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    pub record: HistoryRecord,
    pub download_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryView {
    pub kind: HistoryKind,
    pub heading: &'static str,
    pub columns: Vec<&'static str>,
    pub rows: Vec<HistoryRow>,
}

impl HistoryView {
    pub fn build(kind: HistoryKind, provider: &dyn HistoryProvider) -> Self {
        let rows = provider
            .records(kind)
            .iter()
            .map(|record| HistoryRow {
                download_file: record.file_name(),
                record: record.clone(),
            })
            .collect();

        HistoryView {
            kind,
            heading: kind.heading(),
            columns: kind.columns().to_vec(),
            rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "panel", rename_all = "snake_case")]
pub enum PanelView {
    Form(FormView),
    History(HistoryView),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub title: &'static str,
    pub input_label: &'static str,
    pub input_text: String,
    pub screen: Screen,
    pub last_exchange: Option<Exchange>,
    pub panel: Option<PanelView>,
    /// Acknowledgment of the last form submission, shown once
    pub notice: Option<String>,
    pub start_over_label: &'static str,
}

impl PageView {
    pub fn with_confirmation(mut self, confirmation: Option<&Confirmation>) -> Self {
        self.notice = confirmation.map(|c| c.message.clone());
        self
    }

    /// Show `form` in place of whatever panel was open
    pub fn with_form(mut self, form: FormView) -> Self {
        self.screen = Screen::from(Some(form.kind.panel()));
        self.panel = Some(PanelView::Form(form));
        self
    }

    pub fn form(&self) -> Option<&FormView> {
        match &self.panel {
            Some(PanelView::Form(form)) => Some(form),
            _ => None,
        }
    }

    pub fn history(&self) -> Option<&HistoryView> {
        match &self.panel {
            Some(PanelView::History(history)) => Some(history),
            _ => None,
        }
    }
}

pub fn render(state: &SessionState, history: &dyn HistoryProvider, today: NaiveDate) -> PageView {
    let panel = state.active_panel().map(|panel| match panel {
        Panel::ViewHistory => PanelView::History(HistoryView::build(HistoryKind::Views, history)),
        Panel::ApiHistory => PanelView::History(HistoryView::build(HistoryKind::RestApis, history)),
        Panel::ViewForm => PanelView::Form(FormView::build(FormKind::View, state.preselected(), today)),
        Panel::S3Form => PanelView::Form(FormView::build(FormKind::S3, state.preselected(), today)),
        Panel::ApiForm => PanelView::Form(FormView::build(FormKind::Api, state.preselected(), today)),
    });

    PageView {
        title: PAGE_TITLE,
        input_label: INPUT_LABEL,
        input_text: state.input_text().to_string(),
        screen: state.screen(),
        last_exchange: state.last_exchange().cloned(),
        panel,
        notice: None,
        start_over_label: START_OVER_LABEL,
    }
}
