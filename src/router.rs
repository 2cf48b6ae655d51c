// 🧭 Request Router - keyword rules as data
// Ordered substring rules map a free-text request onto one of the five panels

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::catalog::FieldCategory;

pub const API_HISTORY_RESPONSE: &str = "Displaying the last ten REST API calls.";
pub const VIEW_HISTORY_RESPONSE: &str = "Displaying the last ten view calls.";
pub const VIEW_FORM_RESPONSE: &str = "Understood. Please review the generated UI below and check the data elements you want to include in the view.";
pub const S3_FORM_RESPONSE: &str = "Please review the generated UI and uncheck all the data elements that you don't want to include in the S3 file.";
pub const API_FORM_RESPONSE: &str = "Please review the generated UI and uncheck all the data elements that you don't want to include.";
pub const APOLOGY_RESPONSE: &str = "I'm sorry, I have limited functions. Please try another prompt.";

// ============================================================================
// PANELS
// ============================================================================

/// The five mutually-exclusive panels shown below the chat area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    ViewForm,
    S3Form,
    ApiForm,
    ViewHistory,
    ApiHistory,
}

impl Panel {
    pub const ALL: [Panel; 5] = [
        Panel::ViewForm,
        Panel::S3Form,
        Panel::ApiForm,
        Panel::ViewHistory,
        Panel::ApiHistory,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Panel::ViewForm => "Create View",
            Panel::S3Form => "S3 File",
            Panel::ApiForm => "REST API",
            Panel::ViewHistory => "View History",
            Panel::ApiHistory => "REST API History",
        }
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

// ============================================================================
// RULE DEFINITION
// ============================================================================

/// One routing rule. Matches when every `all_of` keyword occurs in the text.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub id: &'static str,
    pub all_of: &'static [&'static str],
    pub panel: Panel,
    pub response: &'static str,
}

impl RouteRule {
    /// `text` must already be lowercased
    fn matches(&self, text: &str) -> bool {
        self.all_of.iter().all(|kw| text.contains(kw))
    }
}

/// Rules in priority order; first match wins
pub const DEFAULT_RULES: &[RouteRule] = &[
    RouteRule {
        id: "api_history",
        all_of: &["history", "rest api"],
        panel: Panel::ApiHistory,
        response: API_HISTORY_RESPONSE,
    },
    RouteRule {
        id: "view_history",
        all_of: &["history"],
        panel: Panel::ViewHistory,
        response: VIEW_HISTORY_RESPONSE,
    },
    RouteRule {
        id: "create_view",
        all_of: &["create a view"],
        panel: Panel::ViewForm,
        response: VIEW_FORM_RESPONSE,
    },
    RouteRule {
        id: "s3_file",
        all_of: &["s3 file"],
        panel: Panel::S3Form,
        response: S3_FORM_RESPONSE,
    },
    RouteRule {
        id: "rest_api",
        all_of: &["rest api"],
        panel: Panel::ApiForm,
        response: API_FORM_RESPONSE,
    },
];

// ============================================================================
// ROUTE OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteOutcome {
    pub response: String,
    pub panel: Option<Panel>,
    pub preselected: BTreeSet<String>,
    /// Id of the rule that matched, None for the apology branch
    pub rule_id: Option<&'static str>,
}

impl RouteOutcome {
    pub fn is_match(&self) -> bool {
        self.panel.is_some()
    }
}

// ============================================================================
// ROUTER
// ============================================================================

#[derive(Debug, Clone)]
pub struct RequestRouter {
    rules: &'static [RouteRule],
    preselect_fields: bool,
}

impl RequestRouter {
    pub fn new() -> Self {
        RequestRouter {
            rules: DEFAULT_RULES,
            preselect_fields: false,
        }
    }

    /// Enable the keyword → category pre-selection pass (off by default)
    pub fn with_preselection(mut self, enabled: bool) -> Self {
        self.preselect_fields = enabled;
        self
    }

    pub fn preselection_enabled(&self) -> bool {
        self.preselect_fields
    }

    /// Route a request. Never fails: an unrecognised request yields the apology.
    pub fn route(&self, text: &str) -> RouteOutcome {
        let lower = text.to_lowercase();

        let preselected = if self.preselect_fields {
            preselect_categories(&lower)
                .into_iter()
                .flat_map(|c| c.fields().iter().map(|f| f.to_string()))
                .collect()
        } else {
            BTreeSet::new()
        };

        for rule in self.rules {
            if rule.matches(&lower) {
                tracing::debug!(rule = rule.id, panel = ?rule.panel, "request routed");
                return RouteOutcome {
                    response: rule.response.to_string(),
                    panel: Some(rule.panel),
                    preselected,
                    rule_id: Some(rule.id),
                };
            }
        }

        tracing::debug!("no routing rule matched");
        RouteOutcome {
            response: APOLOGY_RESPONSE.to_string(),
            panel: None,
            preselected,
            rule_id: None,
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for RequestRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Categories mentioned by a lowercased request.
/// "noninterest" also contains "interest", so both interest and noninterest
/// categories are selected for e.g. "noninterest income".
fn preselect_categories(lower: &str) -> Vec<FieldCategory> {
    let mut categories = Vec::new();
    let income = lower.contains("income");
    let expense = lower.contains("expense");

    if lower.contains("interest") {
        if income {
            categories.push(FieldCategory::InterestIncome);
        }
        if expense {
            categories.push(FieldCategory::InterestExpense);
        }
    }
    if lower.contains("noninterest") {
        if income {
            categories.push(FieldCategory::NoninterestIncome);
        }
        if expense {
            categories.push(FieldCategory::NoninterestExpense);
        }
    }
    categories
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_with_rest_api_wins() {
        let router = RequestRouter::new();

        for text in [
            "show the history of rest api calls",
            "REST API HISTORY please",
            "History for my Rest Api",
        ] {
            let outcome = router.route(text);
            assert_eq!(outcome.panel, Some(Panel::ApiHistory), "{text}");
            assert_eq!(outcome.response, API_HISTORY_RESPONSE);
        }
    }

    #[test]
    fn test_history_without_rest_api() {
        let router = RequestRouter::new();

        let outcome = router.route("show me the history");
        assert_eq!(outcome.panel, Some(Panel::ViewHistory));
        assert_eq!(outcome.response, VIEW_HISTORY_RESPONSE);

        // history beats create a view
        let outcome = router.route("create a view from the HISTORY");
        assert_eq!(outcome.panel, Some(Panel::ViewHistory));
    }

    #[test]
    fn test_create_view() {
        let router = RequestRouter::new();
        let outcome = router.route("Can you create a view for interest income?");

        assert_eq!(outcome.panel, Some(Panel::ViewForm));
        assert_eq!(
            outcome.response,
            "Understood. Please review the generated UI below and check the data elements you want to include in the view."
        );
        assert!(outcome.preselected.is_empty());
    }

    #[test]
    fn test_s3_before_rest_api() {
        let router = RequestRouter::new();

        let outcome = router.route("Make an S3 File and a REST API");
        assert_eq!(outcome.panel, Some(Panel::S3Form));
        assert_eq!(outcome.response, S3_FORM_RESPONSE);

        let outcome = router.route("I need a rest api");
        assert_eq!(outcome.panel, Some(Panel::ApiForm));
        assert_eq!(outcome.response, API_FORM_RESPONSE);
    }

    #[test]
    fn test_no_match_apologises() {
        let router = RequestRouter::new();

        for text in ["make me lunch", "create view", "s3", "restapi"] {
            let outcome = router.route(text);
            assert_eq!(outcome.panel, None, "{text}");
            assert_eq!(outcome.response, APOLOGY_RESPONSE);
            assert!(!outcome.is_match());
            assert_eq!(outcome.rule_id, None);
        }
    }

    #[test]
    fn test_preselection_disabled_by_default() {
        let router = RequestRouter::default();
        assert!(!router.preselection_enabled());

        let outcome = router.route("create a view for interest income and noninterest expense");
        assert!(outcome.preselected.is_empty());
    }

    #[test]
    fn test_preselection_when_enabled() {
        let router = RequestRouter::new().with_preselection(true);

        let outcome = router.route("create a view for interest income");
        assert_eq!(outcome.preselected.len(), INTEREST_INCOME_LEN);
        assert!(outcome.preselected.contains("securities"));

        let outcome = router.route("create a view for noninterest expense");
        // interest expense + noninterest expense
        assert_eq!(outcome.preselected.len(), 8);
        assert!(outcome.preselected.contains("deposits"));
        assert!(outcome.preselected.contains("amortization_expense"));
    }

    const INTEREST_INCOME_LEN: usize = 8;
}
