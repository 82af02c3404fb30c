//! Database entity definitions.

pub mod applicant;
pub mod guarantor;
pub mod otp;
pub mod work_experience;

pub use applicant::{ApplicantEntity, GenderDb};
pub use guarantor::{GuarantorEntity, GuarantorInvitationEntity, InvitationStatusDb};
pub use otp::OtpCodeEntity;
pub use work_experience::{EmploymentTypeDb, WorkExperienceEntity, WorkTypeDb};
