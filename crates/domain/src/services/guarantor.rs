//! Guarantor invitation workflow.
//!
//! An applicant invites a guarantor by email; the guarantor follows the
//! emailed link and submits a form carrying the invitation token. Invitations
//! move `pending -> completed` on submission or `pending -> expired` once
//! their seven days run out.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use shared::jwt::{extract_applicant_id, JwtConfig, JwtError};
use shared::pagination::{PageMeta, PageQuery, Paginated};
use shared::validation::normalize_email;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::models::guarantor::{
    GuarantorFormRequest, SentInvitation, SubmittedForm, INVITATION_TTL_DAYS,
    MAX_GUARANTORS_PER_APPLICANT,
};
use crate::models::{
    Guarantor, GuarantorInvitation, InvitationStatus, NewGuarantor, NewGuarantorInvitation,
};
use crate::repositories::{ApplicantRepository, GuarantorRepository, GuardedInsert};
use crate::services::error::ServiceError;
use crate::services::mailer::Mailer;

pub struct InvitationWorkflow {
    applicants: Arc<dyn ApplicantRepository>,
    guarantors: Arc<dyn GuarantorRepository>,
    mailer: Arc<dyn Mailer>,
    tokens: Arc<JwtConfig>,
    form_base_url: String,
    invitation_ttl: Duration,
}

impl InvitationWorkflow {
    pub fn new(
        applicants: Arc<dyn ApplicantRepository>,
        guarantors: Arc<dyn GuarantorRepository>,
        mailer: Arc<dyn Mailer>,
        tokens: Arc<JwtConfig>,
        form_base_url: impl Into<String>,
    ) -> Self {
        Self {
            applicants,
            guarantors,
            mailer,
            tokens,
            form_base_url: form_base_url.into(),
            invitation_ttl: Duration::days(INVITATION_TTL_DAYS),
        }
    }

    /// Overrides the seven-day invitation lifetime.
    pub fn with_invitation_ttl(mut self, ttl: Duration) -> Self {
        self.invitation_ttl = ttl;
        self
    }

    /// Link a guarantor follows to reach the form.
    fn form_link(&self, token: &str) -> String {
        format!(
            "{}/guarantor-form?token={}",
            self.form_base_url.trim_end_matches('/'),
            token
        )
    }

    /// Creates a pending invitation and emails the link.
    ///
    /// The invitation is kept even if the email cannot be sent; the result
    /// reports delivery separately.
    pub async fn send_invite(
        &self,
        applicant_id: Uuid,
        email: &str,
    ) -> Result<SentInvitation, ServiceError> {
        let applicant = self
            .applicants
            .find_by_id(applicant_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Applicant not found".to_string()))?;

        let count = self.guarantors.count_for_applicant(applicant_id).await?;
        if count >= MAX_GUARANTORS_PER_APPLICANT {
            return Err(ServiceError::CapacityExceeded);
        }

        let email = normalize_email(email);
        let ttl = self.invitation_ttl;
        let token = self
            .tokens
            .issue_invitation_token(applicant_id, &email, ttl)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        let now = Utc::now();
        let invitation = self
            .guarantors
            .create_invitation(NewGuarantorInvitation {
                applicant_id,
                email: email.clone(),
                link: self.form_link(&token),
                token,
                sent_at: now,
                expires_at: now + ttl,
            })
            .await?;

        let email_delivered = match self
            .mailer
            .send_guarantor_invitation(
                &email,
                &applicant.full_name(),
                &invitation.link,
                invitation.expires_at,
            )
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    applicant_id = %applicant_id,
                    invitation_id = %invitation.id,
                    error = %e,
                    "Guarantor invitation stored but email delivery failed"
                );
                false
            }
        };

        info!(
            applicant_id = %applicant_id,
            invitation_id = %invitation.id,
            email_delivered,
            "Guarantor invitation sent"
        );

        Ok(SentInvitation {
            guarantor_invitation: invitation,
            email_delivered,
        })
    }

    /// Lists an applicant's invitations after expiring stale ones.
    pub async fn get_invites(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<GuarantorInvitation>, ServiceError> {
        let expired = self
            .guarantors
            .expire_stale_invitations(Some(applicant_id), Utc::now())
            .await?;
        if expired > 0 {
            info!(applicant_id = %applicant_id, expired, "Expired stale guarantor invitations");
        }

        Ok(self.guarantors.list_invitations(applicant_id).await?)
    }

    /// Records a guarantor from a submitted form.
    ///
    /// The token is checked before anything else, so a bad or expired token
    /// never touches storage.
    pub async fn submit_form(
        &self,
        token: &str,
        form: GuarantorFormRequest,
    ) -> Result<SubmittedForm, ServiceError> {
        let claims = self
            .tokens
            .validate_invitation_token(token)
            .map_err(|e| match e {
                JwtError::TokenExpired => ServiceError::ExpiredToken,
                _ => ServiceError::InvalidToken,
            })?;
        let applicant_id =
            extract_applicant_id(&claims.sub).map_err(|_| ServiceError::InvalidToken)?;
        let invited_email = normalize_email(&claims.email);

        form.validate()?;
        if let Some(email) = &form.email {
            if normalize_email(email) != invited_email {
                return Err(ServiceError::BadRequest(
                    "Email does not match the invitation".to_string(),
                ));
            }
        }

        // Past its expiry the stored invitation can no longer be completed,
        // whether or not the sweep has marked it yet.
        if let Some(invitation) = self.guarantors.find_invitation_by_token(token).await? {
            if invitation.status == InvitationStatus::Expired || invitation.expires_at <= Utc::now()
            {
                return Err(ServiceError::ExpiredToken);
            }
        }

        let outcome = self
            .guarantors
            .insert_guarded(
                NewGuarantor {
                    applicant_id,
                    name: form.name.trim().to_string(),
                    email: invited_email,
                    phone_number: form.phone_number.trim().to_string(),
                    address: form.address.trim().to_string(),
                    relationship: form.relationship.trim().to_string(),
                    filled_at: Utc::now(),
                },
                token,
                MAX_GUARANTORS_PER_APPLICANT,
            )
            .await?;

        match outcome {
            GuardedInsert::Inserted {
                guarantor,
                invitation_completed,
            } => {
                if invitation_completed {
                    info!(
                        applicant_id = %applicant_id,
                        guarantor_id = %guarantor.id,
                        "Guarantor added and invitation completed"
                    );
                } else {
                    warn!(
                        applicant_id = %applicant_id,
                        guarantor_id = %guarantor.id,
                        "Guarantor added but no pending invitation matched the token"
                    );
                }
                Ok(SubmittedForm {
                    guarantor,
                    invitation_completed,
                })
            }
            GuardedInsert::ApplicantMissing => {
                Err(ServiceError::NotFound("Applicant not found".to_string()))
            }
            GuardedInsert::CapacityReached => Err(ServiceError::CapacityExceeded),
            GuardedInsert::DuplicateEmail => Err(ServiceError::DuplicateGuarantor),
        }
    }

    pub async fn list_guarantors(
        &self,
        applicant_id: Uuid,
        query: &PageQuery,
    ) -> Result<Paginated<Guarantor>, ServiceError> {
        let (items, total) = self
            .guarantors
            .list_guarantors(applicant_id, i64::from(query.limit()), query.offset())
            .await?;

        Ok(Paginated {
            items,
            pagination: PageMeta::new(query, total),
        })
    }

    pub async fn get_guarantor(
        &self,
        applicant_id: Uuid,
        guarantor_id: Uuid,
    ) -> Result<Guarantor, ServiceError> {
        self.guarantors
            .find_guarantor(applicant_id, guarantor_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Guarantor not found".to_string()))
    }

    /// Expires every stale invitation. Used by the background sweep.
    pub async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, ServiceError> {
        Ok(self.guarantors.expire_stale_invitations(None, now).await?)
    }
}
