//! PostgreSQL implementations of the domain repository ports.

pub mod applicant;
pub mod guarantor;
pub mod otp;
pub mod work_experience;

pub use applicant::PgApplicantRepository;
pub use guarantor::PgGuarantorRepository;
pub use otp::PgOtpRepository;
pub use work_experience::PgWorkExperienceRepository;
