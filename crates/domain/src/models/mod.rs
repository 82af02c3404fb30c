//! Domain models for the applicant tracking backend.

pub mod applicant;
pub mod guarantor;
pub mod work_experience;

pub use applicant::{Applicant, ApplicantProfile, Gender, NewApplicant, OtpCode, StoredFile};
pub use guarantor::{
    Guarantor, GuarantorInvitation, InvitationStatus, NewGuarantor, NewGuarantorInvitation,
};
pub use work_experience::{EmploymentType, WorkExperience, WorkExperienceInput, WorkType};
