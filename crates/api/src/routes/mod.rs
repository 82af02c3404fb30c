//! HTTP route handlers.

pub mod applicant_profile;
pub mod guarantors;
pub mod health;
pub mod work_experience;
