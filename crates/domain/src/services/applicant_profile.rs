//! Applicant accounts: signup, login, OTP verification, password reset and
//! profile updates.

use std::sync::Arc;

use chrono::{Duration, Utc};
use shared::crypto::{constant_time_eq, generate_otp, sha256_hex};
use shared::jwt::{extract_applicant_id, JwtConfig};
use shared::password::{hash_password, verify_password};
use shared::validation::normalize_email;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::models::applicant::{
    LoginRequest, ProfileChanges, ResetPasswordRequest, SignupRequest, UpdateProfileRequest,
    VerifyOtpRequest,
};
use crate::models::{Applicant, ApplicantProfile, NewApplicant, StoredFile, WorkExperienceInput};
use crate::repositories::{
    ApplicantRepository, OtpRepository, RepositoryError, WorkExperienceRepository,
};
use crate::services::error::ServiceError;
use crate::services::mailer::{Mailer, OtpPurpose};
use crate::services::storage::{FileStorage, FileUpload};

const RESUME_CONTENT_TYPES: &[&str] = &["application/pdf"];
const AVATAR_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Tunables for the profile service.
#[derive(Debug, Clone)]
pub struct ProfileSettings {
    pub otp_length: usize,
    pub otp_ttl: Duration,
    /// Wrong guesses after which the stored code is discarded.
    pub otp_max_attempts: i32,
    /// Avatar assigned at signup, if any.
    pub default_avatar_url: Option<String>,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            otp_length: shared::crypto::OTP_LENGTH,
            otp_ttl: Duration::minutes(10),
            otp_max_attempts: 5,
            default_avatar_url: None,
        }
    }
}

/// A multipart profile update after parsing.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub fields: UpdateProfileRequest,
    /// Replaces every stored work experience entry when present.
    pub work_experience: Option<Vec<WorkExperienceInput>>,
    pub avatar: Option<FileUpload>,
    pub resume: Option<FileUpload>,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub profile: ApplicantProfile,
    pub session_token: String,
}

/// What `request_otp` / `verify_otp` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpOutcome {
    Sent,
    Verified,
    AlreadyVerified,
}

pub struct ProfileService {
    applicants: Arc<dyn ApplicantRepository>,
    otps: Arc<dyn OtpRepository>,
    work_experience: Arc<dyn WorkExperienceRepository>,
    mailer: Arc<dyn Mailer>,
    storage: Arc<dyn FileStorage>,
    tokens: Arc<JwtConfig>,
    settings: ProfileSettings,
}

impl ProfileService {
    pub fn new(
        applicants: Arc<dyn ApplicantRepository>,
        otps: Arc<dyn OtpRepository>,
        work_experience: Arc<dyn WorkExperienceRepository>,
        mailer: Arc<dyn Mailer>,
        storage: Arc<dyn FileStorage>,
        tokens: Arc<JwtConfig>,
        settings: ProfileSettings,
    ) -> Self {
        Self {
            applicants,
            otps,
            work_experience,
            mailer,
            storage,
            tokens,
            settings,
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Applicant, ServiceError> {
        self.applicants
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| ServiceError::NotFound("Applicant not found".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Applicant, ServiceError> {
        self.applicants
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Applicant not found".to_string()))
    }

    /// Stores a fresh code and mails it. The code is dropped again if the
    /// mail cannot be sent, so a retry is not blocked by "OTP already sent".
    async fn issue_otp(&self, applicant: &Applicant, purpose: OtpPurpose) -> Result<(), ServiceError> {
        let code = generate_otp(self.settings.otp_length);
        let expires_at = Utc::now() + self.settings.otp_ttl;
        self.otps
            .upsert(&applicant.email, &sha256_hex(&code), expires_at)
            .await?;

        if let Err(e) = self
            .mailer
            .send_otp(&applicant.email, &applicant.first_name, &code, purpose)
            .await
        {
            self.otps.delete(&applicant.email).await?;
            return Err(e.into());
        }
        Ok(())
    }

    /// Checks `code` against the active OTP for `email` and consumes it.
    ///
    /// The code is discarded once `otp_max_attempts` wrong guesses have been
    /// made against it, so a new one has to be requested.
    async fn consume_otp(&self, email: &str, code: &str) -> Result<(), ServiceError> {
        let invalid = || ServiceError::BadRequest("Invalid or expired OTP".to_string());
        let stored = self
            .otps
            .find_active(email, Utc::now())
            .await?
            .ok_or_else(invalid)?;

        if !constant_time_eq(&stored.code_hash, &sha256_hex(code.trim())) {
            let attempts = self.otps.record_failed_attempt(email).await?;
            if attempts >= self.settings.otp_max_attempts {
                self.otps.delete(email).await?;
                warn!(attempts, "OTP discarded after too many wrong guesses");
            }
            return Err(invalid());
        }
        self.otps.delete(email).await?;
        Ok(())
    }

    /// Registers an unverified applicant and mails a verification code.
    ///
    /// Returns the profile and whether the code was delivered.
    pub async fn signup(
        &self,
        req: SignupRequest,
    ) -> Result<(ApplicantProfile, bool), ServiceError> {
        req.validate()?;
        let email = normalize_email(&req.email);

        if self.applicants.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict("Applicant already exists".to_string()));
        }

        let password_hash = hash_password(&req.password)?;
        let avatar = self
            .settings
            .default_avatar_url
            .as_ref()
            .map(|url| StoredFile {
                public_id: "default-avatar".to_string(),
                secure_url: url.clone(),
                uploaded_at: Utc::now(),
            });

        let applicant = self
            .applicants
            .create(NewApplicant {
                first_name: req.first_name.trim().to_string(),
                last_name: req.last_name.trim().to_string(),
                email,
                password_hash,
                gender: req.gender,
                avatar,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    ServiceError::Conflict("Applicant already exists".to_string())
                }
                other => other.into(),
            })?;

        let otp_sent = match self.issue_otp(&applicant, OtpPurpose::EmailVerification).await {
            Ok(()) => true,
            Err(e) => {
                warn!(applicant_id = %applicant.id, error = %e, "Signup OTP could not be sent");
                false
            }
        };

        info!(applicant_id = %applicant.id, "Applicant registered");
        Ok((ApplicantProfile::from(&applicant), otp_sent))
    }

    pub async fn login(&self, req: LoginRequest) -> Result<LoginOutcome, ServiceError> {
        req.validate()?;
        let applicant = self.find_by_email(&req.email).await?;

        if !verify_password(&req.password, &applicant.password_hash)? {
            return Err(ServiceError::Unauthorized("Invalid credentials".to_string()));
        }
        if !applicant.is_verified {
            return Err(ServiceError::Forbidden("Email not verified".to_string()));
        }
        if !applicant.is_active {
            return Err(ServiceError::Forbidden("Account is disabled".to_string()));
        }

        let session_token = self
            .tokens
            .issue_session_token(applicant.id, applicant.password_version)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        info!(applicant_id = %applicant.id, "Applicant logged in");
        Ok(LoginOutcome {
            profile: ApplicantProfile::from(&applicant),
            session_token,
        })
    }

    /// Resolves a session token to an active applicant.
    ///
    /// Tokens issued before the last password reset are rejected.
    pub async fn authenticate(&self, token: &str) -> Result<Applicant, ServiceError> {
        let unauthorized = || ServiceError::Unauthorized("Invalid or expired session".to_string());

        let claims = self
            .tokens
            .validate_session_token(token)
            .map_err(|_| unauthorized())?;
        let id = extract_applicant_id(&claims.sub).map_err(|_| unauthorized())?;

        let applicant = self
            .applicants
            .find_by_id(id)
            .await?
            .ok_or_else(unauthorized)?;

        if applicant.password_version != claims.pwv {
            return Err(unauthorized());
        }
        if !applicant.is_active {
            return Err(ServiceError::Forbidden("Account is disabled".to_string()));
        }
        Ok(applicant)
    }

    pub async fn get_profile(&self, applicant_id: Uuid) -> Result<ApplicantProfile, ServiceError> {
        Ok(ApplicantProfile::from(&self.find_by_id(applicant_id).await?))
    }

    pub async fn update_profile(
        &self,
        applicant_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<ApplicantProfile, ServiceError> {
        update.fields.validate()?;
        if let Some(entries) = &update.work_experience {
            for entry in entries {
                entry.validate()?;
            }
        }
        check_content_type(update.resume.as_ref(), RESUME_CONTENT_TYPES)?;
        check_content_type(update.avatar.as_ref(), AVATAR_CONTENT_TYPES)?;

        self.find_by_id(applicant_id).await?;

        let mut changes = ProfileChanges {
            fields: update.fields,
            ..Default::default()
        };
        if let Some(resume) = update.resume {
            let key = format!("applicants/{}/resume.pdf", applicant_id);
            changes.resume = Some(self.storage.upload(&key, resume).await?);
        }
        if let Some(avatar) = update.avatar {
            let key = format!(
                "applicants/{}/avatar.{}",
                applicant_id,
                image_extension(&avatar.content_type)
            );
            changes.avatar = Some(self.storage.upload(&key, avatar).await?);
        }

        if let Some(entries) = &update.work_experience {
            self.work_experience
                .replace_all(applicant_id, entries)
                .await?;
        }

        let applicant = self
            .applicants
            .update_profile(applicant_id, &changes)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Applicant not found".to_string()))?;

        info!(applicant_id = %applicant_id, "Applicant profile updated");
        Ok(ApplicantProfile::from(&applicant))
    }

    /// Mails a verification code unless the account is already verified or a
    /// code is still active.
    pub async fn request_otp(&self, email: &str) -> Result<OtpOutcome, ServiceError> {
        let applicant = self.find_by_email(email).await?;
        if applicant.is_verified {
            return Ok(OtpOutcome::AlreadyVerified);
        }
        if self
            .otps
            .find_active(&applicant.email, Utc::now())
            .await?
            .is_some()
        {
            return Err(ServiceError::BadRequest("OTP already sent".to_string()));
        }

        self.issue_otp(&applicant, OtpPurpose::EmailVerification)
            .await?;
        Ok(OtpOutcome::Sent)
    }

    pub async fn verify_otp(&self, req: VerifyOtpRequest) -> Result<OtpOutcome, ServiceError> {
        req.validate()?;
        let applicant = self.find_by_email(&req.email).await?;
        if applicant.is_verified {
            return Ok(OtpOutcome::AlreadyVerified);
        }

        self.consume_otp(&applicant.email, &req.otp).await?;
        self.applicants.mark_verified(applicant.id).await?;

        info!(applicant_id = %applicant.id, "Applicant email verified");
        Ok(OtpOutcome::Verified)
    }

    /// Mails a reset code, replacing any code still active.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ServiceError> {
        let applicant = self.find_by_email(email).await?;
        self.issue_otp(&applicant, OtpPurpose::PasswordReset).await
    }

    /// Sets a new password and retires every existing session.
    pub async fn reset_password(&self, req: ResetPasswordRequest) -> Result<(), ServiceError> {
        req.validate()?;
        let applicant = self.find_by_email(&req.email).await?;

        self.consume_otp(&applicant.email, &req.otp).await?;
        let hash = hash_password(&req.password)?;
        let version = self.applicants.update_password(applicant.id, &hash).await?;

        info!(applicant_id = %applicant.id, password_version = version, "Password reset");
        Ok(())
    }
}

fn check_content_type(upload: Option<&FileUpload>, allowed: &[&str]) -> Result<(), ServiceError> {
    match upload {
        Some(file) if !allowed.contains(&file.content_type.as_str()) => Err(
            ServiceError::BadRequest(format!("Invalid file type: {}", file.content_type)),
        ),
        _ => Ok(()),
    }
}

fn image_extension(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "jpg",
    }
}
