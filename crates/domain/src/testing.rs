//! In-memory repositories for tests.
//!
//! A single [`InMemoryStore`] implements every repository port over one mutex,
//! so the guarded guarantor insert is atomic just like the SQL version.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::applicant::ProfileChanges;
use crate::models::{
    Applicant, Guarantor, GuarantorInvitation, InvitationStatus, NewApplicant, NewGuarantor,
    NewGuarantorInvitation, OtpCode, WorkExperience, WorkExperienceInput,
};
use crate::repositories::{
    ApplicantRepository, GuarantorRepository, GuardedInsert, OtpRepository, RepositoryError,
    WorkExperienceRepository,
};

#[derive(Debug, Default)]
struct State {
    applicants: HashMap<Uuid, Applicant>,
    otps: HashMap<String, OtpCode>,
    work_experience: Vec<WorkExperience>,
    guarantors: Vec<Guarantor>,
    invitations: Vec<GuarantorInvitation>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Backend("state lock poisoned".to_string()))
    }

    /// Inserts a guarantor directly, bypassing the invitation flow.
    pub fn seed_guarantor(&self, applicant_id: Uuid, email: &str) -> Guarantor {
        let guarantor = Guarantor {
            id: Uuid::new_v4(),
            applicant_id,
            name: "Seeded Guarantor".to_string(),
            email: email.to_lowercase(),
            phone_number: "08030000000".to_string(),
            address: "1 Marina, Lagos".to_string(),
            relationship: "Friend".to_string(),
            filled_at: Utc::now(),
        };
        if let Ok(mut state) = self.lock() {
            state.guarantors.push(guarantor.clone());
        }
        guarantor
    }

    /// Flags an applicant as verified/active without going through OTP.
    pub fn set_flags(&self, applicant_id: Uuid, is_verified: bool, is_active: bool) {
        if let Ok(mut state) = self.lock() {
            if let Some(a) = state.applicants.get_mut(&applicant_id) {
                a.is_verified = is_verified;
                a.is_active = is_active;
            }
        }
    }

    /// Moves an invitation's expiry, e.g. into the past.
    pub fn set_invitation_expiry(&self, token: &str, expires_at: DateTime<Utc>) {
        if let Ok(mut state) = self.lock() {
            if let Some(inv) = state.invitations.iter_mut().find(|i| i.token == token) {
                inv.expires_at = expires_at;
            }
        }
    }

    pub fn invitations(&self) -> Vec<GuarantorInvitation> {
        self.lock().map(|s| s.invitations.clone()).unwrap_or_default()
    }

    pub fn guarantors(&self) -> Vec<Guarantor> {
        self.lock().map(|s| s.guarantors.clone()).unwrap_or_default()
    }
}

fn build_entry(applicant_id: Uuid, input: &WorkExperienceInput) -> WorkExperience {
    let now = Utc::now();
    WorkExperience {
        id: Uuid::new_v4(),
        applicant_id,
        job_title: input.job_title.clone(),
        employment_type: input.employment_type,
        company: input.company.clone(),
        start_date: input.start_date,
        end_date: input.end_date,
        location: input.location.clone(),
        work_type: input.work_type,
        description: input.description.clone(),
        currently_working: input.currently_working,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl ApplicantRepository for InMemoryStore {
    async fn create(&self, new: NewApplicant) -> Result<Applicant, RepositoryError> {
        let mut state = self.lock()?;
        let email = new.email.to_lowercase();
        if state.applicants.values().any(|a| a.email == email) {
            return Err(RepositoryError::Conflict(format!("applicant {}", email)));
        }

        let now = Utc::now();
        let applicant = Applicant {
            id: Uuid::new_v4(),
            first_name: new.first_name,
            last_name: new.last_name,
            email,
            password_hash: new.password_hash,
            gender: new.gender,
            phone_number: None,
            address: None,
            country: None,
            state: None,
            lga: None,
            postal_code: None,
            age: None,
            date_of_birth: None,
            nin: None,
            bvn: None,
            skills: Vec::new(),
            avatar: new.avatar,
            resume: None,
            password_version: 1,
            is_active: true,
            is_verified: false,
            can_take_assessment: false,
            created_at: now,
            updated_at: now,
        };
        state.applicants.insert(applicant.id, applicant.clone());
        Ok(applicant)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Applicant>, RepositoryError> {
        Ok(self.lock()?.applicants.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Applicant>, RepositoryError> {
        let email = email.to_lowercase();
        Ok(self
            .lock()?
            .applicants
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<Applicant>, RepositoryError> {
        let mut state = self.lock()?;
        let Some(a) = state.applicants.get_mut(&id) else {
            return Ok(None);
        };

        let f = &changes.fields;
        if let Some(v) = &f.first_name {
            a.first_name = v.clone();
        }
        if let Some(v) = &f.last_name {
            a.last_name = v.clone();
        }
        if let Some(v) = &f.phone_number {
            a.phone_number = Some(v.clone());
        }
        if let Some(v) = &f.address {
            a.address = Some(v.clone());
        }
        if let Some(v) = &f.country {
            a.country = Some(v.clone());
        }
        if let Some(v) = &f.state {
            a.state = Some(v.clone());
        }
        if let Some(v) = &f.lga {
            a.lga = Some(v.clone());
        }
        if let Some(v) = &f.postal_code {
            a.postal_code = Some(v.clone());
        }
        if let Some(v) = f.age {
            a.age = Some(v);
        }
        if let Some(v) = f.date_of_birth {
            a.date_of_birth = Some(v);
        }
        if let Some(v) = f.gender {
            a.gender = v;
        }
        if let Some(v) = &f.nin {
            a.nin = Some(v.clone());
        }
        if let Some(v) = &f.bvn {
            a.bvn = Some(v.clone());
        }
        if let Some(v) = &f.skills {
            a.skills = v.clone();
        }
        if let Some(v) = &changes.avatar {
            a.avatar = Some(v.clone());
        }
        if let Some(v) = &changes.resume {
            a.resume = Some(v.clone());
        }
        a.updated_at = Utc::now();

        Ok(Some(a.clone()))
    }

    async fn mark_verified(&self, id: Uuid) -> Result<(), RepositoryError> {
        if let Some(a) = self.lock()?.applicants.get_mut(&id) {
            a.is_verified = true;
            a.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<i32, RepositoryError> {
        let mut state = self.lock()?;
        let a = state
            .applicants
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::Backend(format!("applicant {} missing", id)))?;
        a.password_hash = password_hash.to_string();
        a.password_version += 1;
        a.updated_at = Utc::now();
        Ok(a.password_version)
    }
}

#[async_trait]
impl OtpRepository for InMemoryStore {
    async fn upsert(
        &self,
        email: &str,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.lock()?.otps.insert(
            email.to_string(),
            OtpCode {
                email: email.to_string(),
                code_hash: code_hash.to_string(),
                expires_at,
                failed_attempts: 0,
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn find_active(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpCode>, RepositoryError> {
        Ok(self
            .lock()?
            .otps
            .get(email)
            .filter(|otp| !otp.is_expired(now))
            .cloned())
    }

    async fn record_failed_attempt(&self, email: &str) -> Result<i32, RepositoryError> {
        Ok(self
            .lock()?
            .otps
            .get_mut(email)
            .map(|otp| {
                otp.failed_attempts += 1;
                otp.failed_attempts
            })
            .unwrap_or(0))
    }

    async fn delete(&self, email: &str) -> Result<(), RepositoryError> {
        self.lock()?.otps.remove(email);
        Ok(())
    }
}

#[async_trait]
impl WorkExperienceRepository for InMemoryStore {
    async fn list(&self, applicant_id: Uuid) -> Result<Vec<WorkExperience>, RepositoryError> {
        Ok(self
            .lock()?
            .work_experience
            .iter()
            .filter(|w| w.applicant_id == applicant_id)
            .cloned()
            .collect())
    }

    async fn find(
        &self,
        applicant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<WorkExperience>, RepositoryError> {
        Ok(self
            .lock()?
            .work_experience
            .iter()
            .find(|w| w.applicant_id == applicant_id && w.id == id)
            .cloned())
    }

    async fn insert_many(
        &self,
        applicant_id: Uuid,
        entries: &[WorkExperienceInput],
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state
            .work_experience
            .extend(entries.iter().map(|e| build_entry(applicant_id, e)));
        Ok(())
    }

    async fn replace_all(
        &self,
        applicant_id: Uuid,
        entries: &[WorkExperienceInput],
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state
            .work_experience
            .retain(|w| w.applicant_id != applicant_id);
        state
            .work_experience
            .extend(entries.iter().map(|e| build_entry(applicant_id, e)));
        Ok(())
    }

    async fn update(&self, entry: &WorkExperience) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        match state
            .work_experience
            .iter_mut()
            .find(|w| w.applicant_id == entry.applicant_id && w.id == entry.id)
        {
            Some(existing) => {
                *existing = entry.clone();
                existing.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, applicant_id: Uuid, id: Uuid) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        let before = state.work_experience.len();
        state
            .work_experience
            .retain(|w| !(w.applicant_id == applicant_id && w.id == id));
        Ok(state.work_experience.len() != before)
    }
}

#[async_trait]
impl GuarantorRepository for InMemoryStore {
    async fn count_for_applicant(&self, applicant_id: Uuid) -> Result<i64, RepositoryError> {
        Ok(self
            .lock()?
            .guarantors
            .iter()
            .filter(|g| g.applicant_id == applicant_id)
            .count() as i64)
    }

    async fn create_invitation(
        &self,
        new: NewGuarantorInvitation,
    ) -> Result<GuarantorInvitation, RepositoryError> {
        let mut state = self.lock()?;
        if state.invitations.iter().any(|i| i.token == new.token) {
            return Err(RepositoryError::Conflict("invitation token".to_string()));
        }
        let invitation = GuarantorInvitation {
            id: Uuid::new_v4(),
            applicant_id: new.applicant_id,
            email: new.email,
            token: new.token,
            link: new.link,
            status: InvitationStatus::Pending,
            sent_at: new.sent_at,
            completed_at: None,
            expires_at: new.expires_at,
        };
        state.invitations.push(invitation.clone());
        Ok(invitation)
    }

    async fn list_invitations(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<GuarantorInvitation>, RepositoryError> {
        let mut list: Vec<_> = self
            .lock()?
            .invitations
            .iter()
            .filter(|i| i.applicant_id == applicant_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        Ok(list)
    }

    async fn find_invitation_by_token(
        &self,
        token: &str,
    ) -> Result<Option<GuarantorInvitation>, RepositoryError> {
        Ok(self
            .lock()?
            .invitations
            .iter()
            .find(|i| i.token == token)
            .cloned())
    }

    async fn expire_stale_invitations(
        &self,
        applicant_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut state = self.lock()?;
        let mut changed = 0;
        for inv in state.invitations.iter_mut() {
            let in_scope = applicant_id.map_or(true, |id| inv.applicant_id == id);
            if in_scope && inv.is_stale(now) {
                inv.status = InvitationStatus::Expired;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn insert_guarded(
        &self,
        new: NewGuarantor,
        token: &str,
        max_guarantors: i64,
    ) -> Result<GuardedInsert, RepositoryError> {
        let mut state = self.lock()?;
        if !state.applicants.contains_key(&new.applicant_id) {
            return Ok(GuardedInsert::ApplicantMissing);
        }

        let existing: Vec<&Guarantor> = state
            .guarantors
            .iter()
            .filter(|g| g.applicant_id == new.applicant_id)
            .collect();
        if existing.len() as i64 >= max_guarantors {
            return Ok(GuardedInsert::CapacityReached);
        }
        let email = new.email.to_lowercase();
        if existing.iter().any(|g| g.email == email) {
            return Ok(GuardedInsert::DuplicateEmail);
        }

        let guarantor = Guarantor {
            id: Uuid::new_v4(),
            applicant_id: new.applicant_id,
            name: new.name,
            email,
            phone_number: new.phone_number,
            address: new.address,
            relationship: new.relationship,
            filled_at: new.filled_at,
        };
        state.guarantors.push(guarantor.clone());

        let mut invitation_completed = false;
        if let Some(inv) = state.invitations.iter_mut().find(|i| {
            i.token == token
                && i.applicant_id == new.applicant_id
                && i.status == InvitationStatus::Pending
        }) {
            inv.status = InvitationStatus::Completed;
            inv.completed_at = Some(new.filled_at);
            invitation_completed = true;
        }

        Ok(GuardedInsert::Inserted {
            guarantor,
            invitation_completed,
        })
    }

    async fn list_guarantors(
        &self,
        applicant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Guarantor>, i64), RepositoryError> {
        let state = self.lock()?;
        let mut all: Vec<_> = state
            .guarantors
            .iter()
            .filter(|g| g.applicant_id == applicant_id)
            .cloned()
            .collect();
        all.sort_by(|a, b| b.filled_at.cmp(&a.filled_at));
        let total = all.len() as i64;
        let page = all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn find_guarantor(
        &self,
        applicant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Guarantor>, RepositoryError> {
        Ok(self
            .lock()?
            .guarantors
            .iter()
            .find(|g| g.applicant_id == applicant_id && g.id == id)
            .cloned())
    }
}
