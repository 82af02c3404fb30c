//! Domain layer for the applicant tracking backend.
//!
//! This crate contains:
//! - Domain models (Applicant, Guarantor, GuarantorInvitation, WorkExperience)
//! - Repository ports implemented by the persistence crate
//! - Business logic services and their error type

pub mod models;
pub mod repositories;
pub mod services;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;
