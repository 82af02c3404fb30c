//! Shared utilities for the applicant tracking backend.
//!
//! This crate provides functionality used across the other crates:
//! - Signed tokens for applicant sessions and guarantor invitations
//! - Password hashing with Argon2id
//! - One-time codes and hashing helpers
//! - Field validators and page/limit pagination

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
