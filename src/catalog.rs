// 📚 Field Catalog - the fixed bank-data fields a user can pick from
// Four ordered categories plus the access groups a created artifact is granted to

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AgentError;

// ============================================================================
// FIELD CATALOG
// ============================================================================

pub const INTEREST_INCOME_FIELDS: &[&str] = &[
    "loans_secured_by_real_estate",
    "commercial_and_industrial_loans",
    "loans_to_individuals",
    "all_other_loans",
    "lease_financing_receivables",
    "balances_due_from_depository",
    "securities",
    "other_interest_income",
];

pub const INTEREST_EXPENSE_FIELDS: &[&str] = &[
    "deposits",
    "federal_funds_purchased",
    "trading_liabilities",
    "subordinated_notes",
];

pub const NONINTEREST_INCOME_FIELDS: &[&str] = &[
    "fiduciary_activities",
    "service_charges",
    "trading_revenue",
    "securities_related_activities",
    "net_servicing_fees",
    "net_securitization_income",
    "net_gains_on_sales",
    "other_noninterest_income",
];

pub const NONINTEREST_EXPENSE_FIELDS: &[&str] = &[
    "salaries_and_benefits",
    "premises_and_fixed_assets",
    "amortization_expense",
    "other_noninterest_expense",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    InterestIncome,
    InterestExpense,
    NoninterestIncome,
    NoninterestExpense,
}

impl FieldCategory {
    /// All categories in display order
    pub const ALL: [FieldCategory; 4] = [
        FieldCategory::InterestIncome,
        FieldCategory::InterestExpense,
        FieldCategory::NoninterestIncome,
        FieldCategory::NoninterestExpense,
    ];

    /// Field names of this category, in catalog order
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            FieldCategory::InterestIncome => INTEREST_INCOME_FIELDS,
            FieldCategory::InterestExpense => INTEREST_EXPENSE_FIELDS,
            FieldCategory::NoninterestIncome => NONINTEREST_INCOME_FIELDS,
            FieldCategory::NoninterestExpense => NONINTEREST_EXPENSE_FIELDS,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FieldCategory::InterestIncome => "Interest Income Fields",
            FieldCategory::InterestExpense => "Interest Expense Fields",
            FieldCategory::NoninterestIncome => "Noninterest Income Fields",
            FieldCategory::NoninterestExpense => "Noninterest Expense Fields",
        }
    }

    /// Short prefix used to key form controls (e.g. `ii_deposits`)
    pub fn key_prefix(&self) -> &'static str {
        match self {
            FieldCategory::InterestIncome => "ii",
            FieldCategory::InterestExpense => "ie",
            FieldCategory::NoninterestIncome => "ni",
            FieldCategory::NoninterestExpense => "ne",
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields().contains(&field)
    }

    /// Find the category a field belongs to
    pub fn of_field(field: &str) -> Option<FieldCategory> {
        Self::ALL.into_iter().find(|c| c.contains(field))
    }
}

// ============================================================================
// ACCESS GROUPS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccessGroup {
    #[default]
    Operations,
    Supervisor,
    DevOps,
    All,
}

impl AccessGroup {
    /// Selector options in display order
    pub const OPTIONS: [AccessGroup; 4] = [
        AccessGroup::Operations,
        AccessGroup::Supervisor,
        AccessGroup::DevOps,
        AccessGroup::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessGroup::Operations => "Operations",
            AccessGroup::Supervisor => "Supervisor",
            AccessGroup::DevOps => "DevOps",
            AccessGroup::All => "All",
        }
    }
}

impl fmt::Display for AccessGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessGroup {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::OPTIONS
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AgentError::UnknownAccessGroup(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_sizes() {
        assert_eq!(FieldCategory::InterestIncome.fields().len(), 8);
        assert_eq!(FieldCategory::InterestExpense.fields().len(), 4);
        assert_eq!(FieldCategory::NoninterestIncome.fields().len(), 8);
        assert_eq!(FieldCategory::NoninterestExpense.fields().len(), 4);
    }

    #[test]
    fn test_field_lookup() {
        assert_eq!(FieldCategory::of_field("deposits"), Some(FieldCategory::InterestExpense));
        assert_eq!(
            FieldCategory::of_field("other_noninterest_income"),
            Some(FieldCategory::NoninterestIncome)
        );
        assert_eq!(FieldCategory::of_field("lunch"), None);
    }

    #[test]
    fn test_access_group_parse() {
        assert_eq!("DevOps".parse::<AccessGroup>().unwrap(), AccessGroup::DevOps);
        assert_eq!("supervisor".parse::<AccessGroup>().unwrap(), AccessGroup::Supervisor);
        assert!("Admins".parse::<AccessGroup>().is_err());
        assert_eq!(AccessGroup::default(), AccessGroup::Operations);
    }
}
