// 📝 Field Selection Form - shared shape for the view / S3 / REST API panels
// Four checkbox groups seeded from the catalog, a business date, an access group
// and a name. Submission never fails; it only produces an acknowledgment.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::catalog::{AccessGroup, FieldCategory};
use crate::error::{AgentError, AgentResult};
use crate::router::Panel;

pub const DEFAULT_VIEW_NAME: &str = "custom_bank_view";
pub const DEFAULT_FILE_NAME: &str = "custom_bank_data.csv";
pub const API_ACTION_TEXT: &str = "Create a REST API";

// ============================================================================
// FORM KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    View,
    S3,
    Api,
}

impl FormKind {
    pub fn from_panel(panel: Panel) -> Option<FormKind> {
        match panel {
            Panel::ViewForm => Some(FormKind::View),
            Panel::S3Form => Some(FormKind::S3),
            Panel::ApiForm => Some(FormKind::Api),
            Panel::ViewHistory | Panel::ApiHistory => None,
        }
    }

    pub fn panel(&self) -> Panel {
        match self {
            FormKind::View => Panel::ViewForm,
            FormKind::S3 => Panel::S3Form,
            FormKind::Api => Panel::ApiForm,
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            FormKind::View => "Custom Bank Data Selection",
            FormKind::S3 => "S3 File Generation",
            FormKind::Api => "REST API Generation",
        }
    }

    pub fn info(&self) -> &'static str {
        match self {
            FormKind::View => "Uncheck any data elements you don't want to include in the view.",
            FormKind::S3 => "Please provide a business date and uncheck any data elements you don't want in the S3 file.",
            FormKind::Api => "Review the data elements to include in the API. 'businessdate' is mandatory.",
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match self {
            FormKind::View => "Create View",
            FormKind::S3 => "Generate File",
            FormKind::Api => "Create REST API",
        }
    }

    /// Label and default of the free-text name field; the API form has none
    pub fn name_field(&self) -> Option<(&'static str, &'static str)> {
        match self {
            FormKind::View => Some(("Enter View Name", DEFAULT_VIEW_NAME)),
            FormKind::S3 => Some(("Enter S3 File Name", DEFAULT_FILE_NAME)),
            FormKind::Api => None,
        }
    }

    /// Only the API form fixes the business date to today
    pub fn has_date_picker(&self) -> bool {
        !matches!(self, FormKind::Api)
    }

    pub fn slug(&self) -> &'static str {
        match self {
            FormKind::View => "view",
            FormKind::S3 => "s3",
            FormKind::Api => "api",
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for FormKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "view" => Ok(FormKind::View),
            "s3" => Ok(FormKind::S3),
            "api" => Ok(FormKind::Api),
            other => Err(AgentError::UnknownFormKind(other.to_string())),
        }
    }
}

// ============================================================================
// FORM VIEW (what gets drawn)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checkbox {
    /// Control key, e.g. `s3_ii_securities`
    pub key: String,
    pub field: &'static str,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckboxGroup {
    pub category: FieldCategory,
    pub title: &'static str,
    pub boxes: Vec<Checkbox>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusinessDateControl {
    /// Editable date picker with a default value
    Picker { default: NaiveDate },
    /// Disabled, always-checked mandatory field
    Mandatory { label: String, value: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextField {
    pub label: &'static str,
    pub value: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub kind: FormKind,
    pub heading: &'static str,
    pub info: &'static str,
    pub business_date: BusinessDateControl,
    pub groups: Vec<CheckboxGroup>,
    pub access_groups: Vec<AccessGroup>,
    pub default_access_group: AccessGroup,
    /// Name / file name input, or the disabled action text for the API form
    pub text_field: TextField,
    pub submit_label: &'static str,
}

impl FormView {
    pub fn build(kind: FormKind, preselected: &BTreeSet<String>, today: NaiveDate) -> Self {
        let prefix = match kind {
            FormKind::View => String::new(),
            other => format!("{}_", other.slug()),
        };

        let groups = FieldCategory::ALL
            .iter()
            .map(|category| CheckboxGroup {
                category: *category,
                title: category.title(),
                boxes: category
                    .fields()
                    .iter()
                    .map(|field| Checkbox {
                        key: format!("{}{}_{}", prefix, category.key_prefix(), field),
                        field: *field,
                        checked: preselected.contains(*field),
                    })
                    .collect(),
            })
            .collect();

        let business_date = if kind.has_date_picker() {
            BusinessDateControl::Picker { default: today }
        } else {
            BusinessDateControl::Mandatory {
                label: format!("businessdate (value: {})", today.format("%Y-%m-%d")),
                value: today,
            }
        };

        let text_field = match kind.name_field() {
            Some((label, default)) => TextField {
                label,
                value: default.to_string(),
                disabled: false,
            },
            None => TextField {
                label: "Action",
                value: API_ACTION_TEXT.to_string(),
                disabled: true,
            },
        };

        FormView {
            kind,
            heading: kind.heading(),
            info: kind.info(),
            business_date,
            groups,
            access_groups: AccessGroup::OPTIONS.to_vec(),
            default_access_group: AccessGroup::default(),
            text_field,
            submit_label: kind.submit_label(),
        }
    }

    /// Re-seed the controls with what was just handed in
    pub fn with_submission(mut self, submission: &FormSubmission) -> Self {
        let checked: BTreeSet<&str> = submission
            .selected
            .values()
            .flatten()
            .map(String::as_str)
            .collect();

        for group in &mut self.groups {
            for b in &mut group.boxes {
                b.checked = checked.contains(b.field);
            }
        }
        if let BusinessDateControl::Picker { default } = &mut self.business_date {
            *default = submission.business_date;
        }
        self.default_access_group = submission.access_group;
        if !self.text_field.disabled {
            self.text_field.value = submission.display_name().to_string();
        }
        self
    }

    pub fn checked_fields(&self) -> Vec<&'static str> {
        self.groups
            .iter()
            .flat_map(|g| g.boxes.iter().filter(|b| b.checked).map(|b| b.field))
            .collect()
    }
}

// ============================================================================
// FORM SUBMISSION
// ============================================================================

/// What the user handed in. Ephemeral: only echoed back in the confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormSubmission {
    pub kind: FormKind,
    pub business_date: NaiveDate,
    pub selected: BTreeMap<FieldCategory, Vec<String>>,
    pub access_group: AccessGroup,
    pub name: Option<String>,
}

impl FormSubmission {
    /// Build from the checked field names. Unknown names are ignored and each
    /// category keeps catalog order. The API form has no name.
    pub fn new<'a>(
        kind: FormKind,
        business_date: NaiveDate,
        checked: impl IntoIterator<Item = &'a str>,
        access_group: AccessGroup,
        name: Option<String>,
    ) -> Self {
        let checked: BTreeSet<&str> = checked.into_iter().collect();

        let selected = FieldCategory::ALL
            .iter()
            .map(|category| {
                let fields = category
                    .fields()
                    .iter()
                    .filter(|f| checked.contains(**f))
                    .map(|f| f.to_string())
                    .collect();
                (*category, fields)
            })
            .collect();

        let name = match kind {
            FormKind::Api => None,
            _ => name,
        };

        FormSubmission {
            kind,
            business_date,
            selected,
            access_group,
            name,
        }
    }

    pub fn selected_in(&self, category: FieldCategory) -> &[String] {
        self.selected
            .get(&category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn selected_count(&self) -> usize {
        self.selected.values().map(|v| v.len()).sum()
    }

    /// The chosen name, falling back to the form default
    pub fn display_name(&self) -> &str {
        match (&self.name, self.kind.name_field()) {
            (Some(name), _) => name.as_str(),
            (None, Some((_, default))) => default,
            (None, None) => API_ACTION_TEXT,
        }
    }

    pub fn confirmation_message(&self) -> String {
        let date = self.business_date.format("%Y-%m-%d");
        match self.kind {
            FormKind::View => format!(
                "Success! The view '{}' for business date {} has been created for the '{}' group.",
                self.display_name(),
                date,
                self.access_group
            ),
            FormKind::S3 => format!(
                "Success! The file '{}' for business date {} is being generated for the '{}' group.",
                self.display_name(),
                date,
                self.access_group
            ),
            FormKind::Api => format!(
                "Success! The REST API for business date {} is being created for the '{}' group.",
                date, self.access_group
            ),
        }
    }
}

/// Parse an ISO business date as typed into a picker
pub fn parse_business_date(value: &str) -> AgentResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AgentError::InvalidDate(value.to_string()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_form_view_defaults_unchecked() {
        let view = FormView::build(FormKind::View, &BTreeSet::new(), date(2025, 6, 16));

        assert_eq!(view.groups.len(), 4);
        assert_eq!(view.groups.iter().map(|g| g.boxes.len()).sum::<usize>(), 24);
        assert!(view.checked_fields().is_empty());
        assert_eq!(view.business_date, BusinessDateControl::Picker { default: date(2025, 6, 16) });
        assert_eq!(view.text_field.value, "custom_bank_view");
        assert_eq!(view.groups[0].boxes[0].key, "ii_loans_secured_by_real_estate");
    }

    #[test]
    fn test_form_view_seeds_preselection() {
        let preselected: BTreeSet<String> = ["deposits".to_string(), "securities".to_string()].into();
        let view = FormView::build(FormKind::S3, &preselected, date(2025, 6, 16));

        assert_eq!(view.checked_fields(), vec!["securities", "deposits"]);
        assert_eq!(view.groups[1].boxes[0].key, "s3_ie_deposits");
        assert_eq!(view.text_field.value, "custom_bank_data.csv");
    }

    #[test]
    fn test_api_form_has_mandatory_business_date() {
        let view = FormView::build(FormKind::Api, &BTreeSet::new(), date(2025, 6, 16));

        match &view.business_date {
            BusinessDateControl::Mandatory { label, value } => {
                assert_eq!(label, "businessdate (value: 2025-06-16)");
                assert_eq!(*value, date(2025, 6, 16));
            }
            other => panic!("expected mandatory date, got {:?}", other),
        }
        assert!(view.text_field.disabled);
        assert_eq!(view.text_field.value, "Create a REST API");
        assert_eq!(view.access_groups.len(), 4);
    }

    #[test]
    fn test_form_view_keeps_submitted_values() {
        let submission = FormSubmission::new(
            FormKind::View,
            date(2025, 6, 14),
            ["securities", "deposits"],
            AccessGroup::Supervisor,
            Some(String::new()),
        );
        let view = FormView::build(FormKind::View, &BTreeSet::new(), date(2025, 6, 16))
            .with_submission(&submission);

        assert_eq!(view.checked_fields(), vec!["securities", "deposits"]);
        assert_eq!(view.business_date, BusinessDateControl::Picker { default: date(2025, 6, 14) });
        assert_eq!(view.default_access_group, AccessGroup::Supervisor);
        assert_eq!(view.text_field.value, "");

        let api = FormSubmission::new(FormKind::Api, date(2025, 6, 16), [], AccessGroup::All, None);
        let view = FormView::build(FormKind::Api, &BTreeSet::new(), date(2025, 6, 16)).with_submission(&api);
        assert_eq!(view.text_field.value, "Create a REST API");
        assert_eq!(view.default_access_group, AccessGroup::All);
    }

    #[test]
    fn test_submission_splits_by_category() {
        let submission = FormSubmission::new(
            FormKind::View,
            date(2025, 6, 14),
            ["securities", "deposits", "all_other_loans", "not_a_field", "amortization_expense"],
            AccessGroup::Supervisor,
            Some("q2_view".to_string()),
        );

        assert_eq!(
            submission.selected_in(FieldCategory::InterestIncome),
            &["all_other_loans".to_string(), "securities".to_string()]
        );
        assert_eq!(submission.selected_in(FieldCategory::InterestExpense), &["deposits".to_string()]);
        assert!(submission.selected_in(FieldCategory::NoninterestIncome).is_empty());
        assert_eq!(submission.selected_count(), 4);
    }

    #[test]
    fn test_confirmation_echoes_inputs_regardless_of_checkboxes() {
        for checked in [vec![], vec!["securities"], FieldCategory::InterestIncome.fields().to_vec()] {
            let submission = FormSubmission::new(
                FormKind::View,
                date(2025, 6, 14),
                checked,
                AccessGroup::DevOps,
                Some("my_view".to_string()),
            );
            assert_eq!(
                submission.confirmation_message(),
                "Success! The view 'my_view' for business date 2025-06-14 has been created for the 'DevOps' group."
            );
        }
    }

    #[test]
    fn test_s3_and_api_confirmations() {
        let s3 = FormSubmission::new(
            FormKind::S3,
            date(2025, 1, 2),
            [],
            AccessGroup::All,
            Some("extract.csv".to_string()),
        );
        assert_eq!(
            s3.confirmation_message(),
            "Success! The file 'extract.csv' for business date 2025-01-02 is being generated for the 'All' group."
        );

        let api = FormSubmission::new(
            FormKind::Api,
            date(2025, 1, 2),
            ["deposits"],
            AccessGroup::Operations,
            Some("ignored".to_string()),
        );
        assert_eq!(api.name, None);
        assert_eq!(
            api.confirmation_message(),
            "Success! The REST API for business date 2025-01-02 is being created for the 'Operations' group."
        );
    }

    #[test]
    fn test_parse_business_date() {
        assert_eq!(parse_business_date("2025-06-14").unwrap(), date(2025, 6, 14));
        assert!(matches!(parse_business_date("6/14/2025"), Err(AgentError::InvalidDate(_))));
    }
}
