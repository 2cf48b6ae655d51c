// 🕘 History Panels - last ten view calls / REST API calls
// Rows come from an embedded sample dataset behind the HistoryProvider seam

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AgentError, AgentResult};

const VIEW_HISTORY_CSV: &str = include_str!("../data/view_history.csv");
const API_HISTORY_CSV: &str = include_str!("../data/api_history.csv");

pub const CSV_CONTENT_TYPE: &str = "text/csv";

// ============================================================================
// HISTORY KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Views,
    RestApis,
}

impl HistoryKind {
    pub fn heading(&self) -> &'static str {
        match self {
            HistoryKind::Views => "History of Last 10 View Calls",
            HistoryKind::RestApis => "History of Last 10 REST API Calls",
        }
    }

    /// Header of the first column; also used as the key in row exports
    pub fn name_column(&self) -> &'static str {
        match self {
            HistoryKind::Views => "View Name",
            HistoryKind::RestApis => "REST API Name",
        }
    }

    /// Path segment used by the web routes and CLI
    pub fn slug(&self) -> &'static str {
        match self {
            HistoryKind::Views => "views",
            HistoryKind::RestApis => "apis",
        }
    }

    pub fn columns(&self) -> [&'static str; 5] {
        [
            self.name_column(),
            "Access Timestamp",
            "Accessed By",
            "Business Date",
            "Download",
        ]
    }
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for HistoryKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "views" | "view" => Ok(HistoryKind::Views),
            "apis" | "api" | "rest_apis" | "rest-apis" => Ok(HistoryKind::RestApis),
            other => Err(AgentError::UnknownHistoryKind(other.to_string())),
        }
    }
}

// ============================================================================
// HISTORY RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "Name", alias = "View Name", alias = "REST API Name")]
    pub name: String,

    #[serde(rename = "Access Timestamp")]
    pub access_timestamp: String,

    #[serde(rename = "Accessed By")]
    pub accessed_by: String,

    #[serde(rename = "Business Date")]
    pub business_date: String,
}

impl HistoryRecord {
    /// Download file name for this row
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name)
    }
}

/// A single-row export ready to be written to disk or sent as a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Serialize one record as `field,value` pairs, one per line
pub fn export_record(kind: HistoryKind, record: &HistoryRecord) -> AgentResult<CsvExport> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    wtr.write_record(["Field", "Value"])?;
    wtr.write_record([kind.name_column(), record.name.as_str()])?;
    wtr.write_record(["Access Timestamp", record.access_timestamp.as_str()])?;
    wtr.write_record(["Accessed By", record.accessed_by.as_str()])?;
    wtr.write_record(["Business Date", record.business_date.as_str()])?;

    let body = wtr
        .into_inner()
        .map_err(|e| AgentError::Io(e.into_error()))?;

    tracing::info!(kind = %kind, record = %record.name, "history row exported");

    Ok(CsvExport {
        file_name: record.file_name(),
        content_type: CSV_CONTENT_TYPE,
        body,
    })
}

// ============================================================================
// PROVIDER
// ============================================================================

pub trait HistoryProvider: Send + Sync {
    fn records(&self, kind: HistoryKind) -> &[HistoryRecord];

    fn find(&self, kind: HistoryKind, name: &str) -> AgentResult<&HistoryRecord> {
        self.records(kind)
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| AgentError::RecordNotFound {
                kind: kind.to_string(),
                name: name.to_string(),
            })
    }

    fn export(&self, kind: HistoryKind, name: &str) -> AgentResult<CsvExport> {
        let record = self.find(kind, name)?;
        export_record(kind, record)
    }
}

/// Sample dataset compiled into the binary
#[derive(Debug, Clone)]
pub struct StaticHistoryProvider {
    views: Vec<HistoryRecord>,
    rest_apis: Vec<HistoryRecord>,
}

impl StaticHistoryProvider {
    pub fn load() -> AgentResult<Self> {
        Ok(StaticHistoryProvider {
            views: parse_history(VIEW_HISTORY_CSV)?,
            rest_apis: parse_history(API_HISTORY_CSV)?,
        })
    }

    pub fn from_records(views: Vec<HistoryRecord>, rest_apis: Vec<HistoryRecord>) -> Self {
        StaticHistoryProvider { views, rest_apis }
    }
}

impl HistoryProvider for StaticHistoryProvider {
    fn records(&self, kind: HistoryKind) -> &[HistoryRecord] {
        match kind {
            HistoryKind::Views => &self.views,
            HistoryKind::RestApis => &self.rest_apis,
        }
    }
}

fn parse_history(data: &str) -> AgentResult<Vec<HistoryRecord>> {
    let mut rdr = csv::Reader::from_reader(data.as_bytes());

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: HistoryRecord = result.map_err(|e| AgentError::Dataset(e.to_string()))?;
        records.push(record);
    }

    Ok(records)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_dataset_has_ten_rows_each() {
        let provider = StaticHistoryProvider::load().unwrap();

        assert_eq!(provider.records(HistoryKind::Views).len(), 10);
        assert_eq!(provider.records(HistoryKind::RestApis).len(), 10);

        let first = &provider.records(HistoryKind::Views)[0];
        assert_eq!(first.name, "GetAllInterestIncomeData");
        assert_eq!(first.access_timestamp, "6/16/2025 16:00");
        assert_eq!(first.accessed_by, "JohnP");
        assert_eq!(first.business_date, "6/14/2025");

        let last = &provider.records(HistoryKind::RestApis)[9];
        assert_eq!(last.name, "GetRESTInterestRateData");
        assert_eq!(last.accessed_by, "AnthonyMartinez");
    }

    #[test]
    fn test_export_single_row() {
        let provider = StaticHistoryProvider::load().unwrap();
        let export = provider.export(HistoryKind::RestApis, "GetRESTBranchMetrics").unwrap();

        assert_eq!(export.file_name, "GetRESTBranchMetrics.csv");
        assert_eq!(export.content_type, "text/csv");

        let body = String::from_utf8(export.body).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Field,Value",
                "REST API Name,GetRESTBranchMetrics",
                "Access Timestamp,6/15/2025 18:08",
                "Accessed By,DanielMiller",
                "Business Date,6/13/2025",
            ]
        );
    }

    #[test]
    fn test_unknown_record() {
        let provider = StaticHistoryProvider::load().unwrap();
        let err = provider.find(HistoryKind::Views, "GetRESTBranchMetrics").unwrap_err();
        assert!(matches!(err, AgentError::RecordNotFound { .. }));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("views".parse::<HistoryKind>().unwrap(), HistoryKind::Views);
        assert_eq!("APIs".parse::<HistoryKind>().unwrap(), HistoryKind::RestApis);
        assert!("calls".parse::<HistoryKind>().is_err());
        assert_eq!(HistoryKind::Views.columns()[0], "View Name");
        assert_eq!(HistoryKind::RestApis.columns()[4], "Download");
    }
}
