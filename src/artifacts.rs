// Artifact creation seam
// Views, S3 files and REST APIs are never really provisioned: the simulated
// creator only acknowledges the request. A real backend plugs in here.

use serde::Serialize;

use crate::forms::{FormKind, FormSubmission};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub kind: FormKind,
    pub message: String,
    pub selected_count: usize,
}

/// Collaborator that would create a view / S3 file / REST API.
/// Infallible: every submission is acknowledged.
pub trait ArtifactCreator: Send + Sync {
    fn create(&self, submission: &FormSubmission) -> Confirmation;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedArtifactCreator;

impl ArtifactCreator for SimulatedArtifactCreator {
    fn create(&self, submission: &FormSubmission) -> Confirmation {
        tracing::info!(
            kind = %submission.kind,
            name = submission.display_name(),
            business_date = %submission.business_date,
            access_group = %submission.access_group,
            fields = submission.selected_count(),
            "artifact requested (simulated)"
        );

        Confirmation {
            kind: submission.kind,
            message: submission.confirmation_message(),
            selected_count: submission.selected_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AccessGroup;
    use chrono::NaiveDate;

    #[test]
    fn test_simulated_creator_acknowledges() {
        let submission = FormSubmission::new(
            FormKind::S3,
            NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
            ["deposits", "securities"],
            AccessGroup::Supervisor,
            None,
        );

        let confirmation = SimulatedArtifactCreator.create(&submission);

        assert_eq!(confirmation.kind, FormKind::S3);
        assert_eq!(confirmation.selected_count, 2);
        assert_eq!(
            confirmation.message,
            "Success! The file 'custom_bank_data.csv' for business date 2025-06-14 is being generated for the 'Supervisor' group."
        );
    }
}
