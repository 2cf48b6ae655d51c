// Data Access Agent - Core Library
// Session core shared by the terminal UI, the one-shot CLI and the web server

pub mod catalog;
pub mod error;
pub mod router;
pub mod session;
pub mod forms;
pub mod artifacts;
pub mod history;
pub mod render;
pub mod config;

// Only compile the web layer when the server feature is enabled
#[cfg(feature = "server")]
pub mod web;

// Re-export commonly used types
pub use catalog::{AccessGroup, FieldCategory};
pub use error::{AgentError, AgentResult};
pub use router::{Panel, RequestRouter, RouteOutcome, RouteRule};
pub use session::{Exchange, Screen, SessionState};
pub use forms::{FormKind, FormSubmission, FormView};
pub use artifacts::{ArtifactCreator, Confirmation, SimulatedArtifactCreator};
pub use history::{CsvExport, HistoryKind, HistoryProvider, HistoryRecord, StaticHistoryProvider};
pub use render::{render, PageView, PanelView};
pub use config::AgentConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
