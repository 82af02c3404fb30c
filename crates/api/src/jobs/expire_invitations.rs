//! Periodic sweep moving overdue guarantor invitations to `expired`.

use std::sync::Arc;

use chrono::Utc;
use domain::services::InvitationWorkflow;
use tracing::info;

use super::scheduler::{Job, JobFrequency};
use crate::middleware::metrics::record_invitations_expired;

pub struct ExpireInvitationsJob {
    workflow: Arc<InvitationWorkflow>,
    every_minutes: u64,
}

impl ExpireInvitationsJob {
    pub fn new(workflow: Arc<InvitationWorkflow>, every_minutes: u64) -> Self {
        Self {
            workflow,
            every_minutes,
        }
    }
}

#[async_trait::async_trait]
impl Job for ExpireInvitationsJob {
    fn name(&self) -> &'static str {
        "expire_invitations"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.every_minutes)
    }

    async fn execute(&self) -> Result<(), String> {
        let expired = self
            .workflow
            .expire_stale(Utc::now())
            .await
            .map_err(|e| e.to_string())?;

        record_invitations_expired(expired);
        if expired > 0 {
            info!(expired, "Expired stale guarantor invitations");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::models::{Gender, InvitationStatus, NewApplicant};
    use domain::repositories::ApplicantRepository;
    use domain::services::MockMailer;
    use domain::testing::InMemoryStore;
    use shared::jwt::JwtConfig;

    #[tokio::test]
    async fn test_sweep_expires_only_overdue_pending() {
        let store = Arc::new(InMemoryStore::new());
        let workflow = Arc::new(InvitationWorkflow::new(
            store.clone(),
            store.clone(),
            Arc::new(MockMailer::new()),
            Arc::new(JwtConfig::new("sweep-test-secret-0123456789abcdefgh", 3600).unwrap()),
            "https://app.test",
        ));

        let applicant = store
            .create(NewApplicant {
                first_name: "Ada".to_string(),
                last_name: "Obi".to_string(),
                email: "ada@example.com".to_string(),
                password_hash: "x".to_string(),
                gender: Gender::Female,
                avatar: None,
            })
            .await
            .unwrap();

        let stale = workflow
            .send_invite(applicant.id, "old@example.com")
            .await
            .unwrap();
        workflow
            .send_invite(applicant.id, "fresh@example.com")
            .await
            .unwrap();
        store.set_invitation_expiry(
            &stale.guarantor_invitation.token,
            Utc::now() - Duration::hours(1),
        );

        let job = ExpireInvitationsJob::new(workflow, 15);
        assert_eq!(job.frequency(), JobFrequency::Minutes(15));
        tokio_test::assert_ok!(job.execute().await);

        let statuses: Vec<(String, InvitationStatus)> = store
            .invitations()
            .into_iter()
            .map(|i| (i.email, i.status))
            .collect();
        assert!(statuses.contains(&("old@example.com".to_string(), InvitationStatus::Expired)));
        assert!(statuses.contains(&("fresh@example.com".to_string(), InvitationStatus::Pending)));
    }
}
