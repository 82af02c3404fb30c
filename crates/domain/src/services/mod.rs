//! Domain services.
//!
//! Services hold their collaborators as trait objects and are built once at
//! startup.

pub mod applicant_profile;
pub mod error;
pub mod guarantor;
pub mod mailer;
pub mod storage;
pub mod work_experience;

pub use applicant_profile::{LoginOutcome, OtpOutcome, ProfileService, ProfileSettings, ProfileUpdate};
pub use error::ServiceError;
pub use guarantor::InvitationWorkflow;
pub use mailer::{MailError, Mailer, MockMailer, OtpPurpose, SentMail};
pub use storage::{FileStorage, FileUpload, MockFileStorage, StorageError};
pub use work_experience::WorkExperienceService;
