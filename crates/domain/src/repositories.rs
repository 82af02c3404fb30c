//! Storage ports implemented by the persistence crate.
//!
//! Services hold these as `Arc<dyn ...>` so tests can swap in the in-memory
//! implementations from [`crate::testing`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::applicant::ProfileChanges;
use crate::models::{
    Applicant, Guarantor, GuarantorInvitation, NewApplicant, NewGuarantor, NewGuarantorInvitation,
    OtpCode, WorkExperience, WorkExperienceInput,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Record already exists: {0}")]
    Conflict(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ApplicantRepository: Send + Sync {
    /// Inserts an unverified applicant. Fails with `Conflict` on a taken email.
    async fn create(&self, new: NewApplicant) -> Result<Applicant, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Applicant>, RepositoryError>;

    /// Looks up by normalized (lowercase) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Applicant>, RepositoryError>;

    /// Writes the present fields of `changes`; returns the updated row.
    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<Applicant>, RepositoryError>;

    async fn mark_verified(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// Stores a new password hash and bumps the password version.
    /// Returns the new version.
    async fn update_password(&self, id: Uuid, password_hash: &str)
        -> Result<i32, RepositoryError>;
}

#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Replaces any code stored for `email`.
    async fn upsert(
        &self,
        email: &str,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Returns the code for `email` if it has not expired at `now`.
    async fn find_active(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpCode>, RepositoryError>;

    /// Counts a wrong guess against the code for `email` and returns the
    /// new total. Returns 0 when no code is stored.
    async fn record_failed_attempt(&self, email: &str) -> Result<i32, RepositoryError>;

    async fn delete(&self, email: &str) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait WorkExperienceRepository: Send + Sync {
    /// All entries of an applicant, oldest first.
    async fn list(&self, applicant_id: Uuid) -> Result<Vec<WorkExperience>, RepositoryError>;

    async fn find(
        &self,
        applicant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<WorkExperience>, RepositoryError>;

    async fn insert_many(
        &self,
        applicant_id: Uuid,
        entries: &[WorkExperienceInput],
    ) -> Result<(), RepositoryError>;

    /// Deletes every entry of the applicant and inserts `entries` in one transaction.
    async fn replace_all(
        &self,
        applicant_id: Uuid,
        entries: &[WorkExperienceInput],
    ) -> Result<(), RepositoryError>;

    /// Writes every field of `entry`. Returns false if it no longer exists.
    async fn update(&self, entry: &WorkExperience) -> Result<bool, RepositoryError>;

    async fn delete(&self, applicant_id: Uuid, id: Uuid) -> Result<bool, RepositoryError>;
}

/// Outcome of [`GuarantorRepository::insert_guarded`].
#[derive(Debug, Clone)]
pub enum GuardedInsert {
    Inserted {
        guarantor: Guarantor,
        /// Whether a pending invitation for the token was moved to `completed`.
        invitation_completed: bool,
    },
    ApplicantMissing,
    CapacityReached,
    DuplicateEmail,
}

#[async_trait]
pub trait GuarantorRepository: Send + Sync {
    async fn count_for_applicant(&self, applicant_id: Uuid) -> Result<i64, RepositoryError>;

    async fn create_invitation(
        &self,
        new: NewGuarantorInvitation,
    ) -> Result<GuarantorInvitation, RepositoryError>;

    /// Invitations of an applicant, newest first.
    async fn list_invitations(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<GuarantorInvitation>, RepositoryError>;

    async fn find_invitation_by_token(
        &self,
        token: &str,
    ) -> Result<Option<GuarantorInvitation>, RepositoryError>;

    /// Moves pending invitations with `expires_at <= now` to `expired`,
    /// optionally for one applicant only. Returns the number of rows changed.
    async fn expire_stale_invitations(
        &self,
        applicant_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    /// Atomically checks that the applicant exists, has fewer than
    /// `max_guarantors` guarantors and none with the same email, then inserts
    /// the guarantor and completes the pending invitation matching
    /// `(token, applicant)`.
    async fn insert_guarded(
        &self,
        new: NewGuarantor,
        token: &str,
        max_guarantors: i64,
    ) -> Result<GuardedInsert, RepositoryError>;

    /// One page of an applicant's guarantors (newest first) and the total count.
    async fn list_guarantors(
        &self,
        applicant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Guarantor>, i64), RepositoryError>;

    async fn find_guarantor(
        &self,
        applicant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Guarantor>, RepositoryError>;
}
