//! Applicant domain models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{validate_person_name, validate_phone_number};
use uuid::Uuid;
use validator::Validate;

/// Applicant gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("Invalid gender: {}", other)),
        }
    }
}

/// A file held in object storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    /// Storage key, used to replace or delete the object.
    pub public_id: String,
    pub secure_url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// An applicant account as stored.
#[derive(Debug, Clone)]
pub struct Applicant {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub gender: Gender,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub lga: Option<String>,
    pub postal_code: Option<String>,
    pub age: Option<i32>,
    pub date_of_birth: Option<NaiveDate>,
    pub nin: Option<String>,
    pub bvn: Option<String>,
    pub skills: Vec<String>,
    pub avatar: Option<StoredFile>,
    pub resume: Option<StoredFile>,
    pub password_version: i32,
    pub is_active: bool,
    pub is_verified: bool,
    pub can_take_assessment: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Applicant {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Data needed to register an applicant.
#[derive(Debug, Clone)]
pub struct NewApplicant {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub gender: Gender,
    pub avatar: Option<StoredFile>,
}

/// Public view of an applicant. Never carries credentials.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: Gender,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub lga: Option<String>,
    pub postal_code: Option<String>,
    pub age: Option<i32>,
    pub date_of_birth: Option<NaiveDate>,
    pub nin: Option<String>,
    pub bvn: Option<String>,
    pub skills: Vec<String>,
    pub avatar: Option<StoredFile>,
    pub resume: Option<StoredFile>,
    pub is_active: bool,
    pub is_verified: bool,
    pub can_take_assessment: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Applicant> for ApplicantProfile {
    fn from(a: &Applicant) -> Self {
        Self {
            id: a.id,
            first_name: a.first_name.clone(),
            last_name: a.last_name.clone(),
            email: a.email.clone(),
            gender: a.gender,
            phone_number: a.phone_number.clone(),
            address: a.address.clone(),
            country: a.country.clone(),
            state: a.state.clone(),
            lga: a.lga.clone(),
            postal_code: a.postal_code.clone(),
            age: a.age,
            date_of_birth: a.date_of_birth,
            nin: a.nin.clone(),
            bvn: a.bvn.clone(),
            skills: a.skills.clone(),
            avatar: a.avatar.clone(),
            resume: a.resume.clone(),
            is_active: a.is_active,
            is_verified: a.is_verified,
            can_take_assessment: a.can_take_assessment,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

/// Signup request body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(
        length(min = 1, max = 100, message = "First name must be 1-100 characters"),
        custom(function = "validate_person_name")
    )]
    pub first_name: String,

    #[validate(
        length(min = 1, max = 100, message = "Last name must be 1-100 characters"),
        custom(function = "validate_person_name")
    )]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 5, message = "Password must be at least 5 characters"))]
    pub password: String,

    pub gender: Gender,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body carrying only an email (request-otp, forgot-password).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EmailRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 4, max = 10, message = "Invalid OTP format"))]
    pub otp: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 4, max = 10, message = "Invalid OTP format"))]
    pub otp: String,

    #[validate(length(min = 5, message = "Password must be at least 5 characters"))]
    pub password: String,
}

/// Editable profile fields. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 1, max = 100, message = "First name must be 1-100 characters"),
        custom(function = "validate_person_name")
    )]
    pub first_name: Option<String>,

    #[validate(
        length(min = 1, max = 100, message = "Last name must be 1-100 characters"),
        custom(function = "validate_person_name")
    )]
    pub last_name: Option<String>,

    #[validate(custom(function = "validate_phone_number"))]
    pub phone_number: Option<String>,

    #[validate(length(max = 300, message = "Address must be at most 300 characters"))]
    pub address: Option<String>,

    #[validate(length(max = 100))]
    pub country: Option<String>,

    #[validate(length(max = 100))]
    pub state: Option<String>,

    #[validate(length(max = 100))]
    pub lga: Option<String>,

    #[validate(length(max = 20))]
    pub postal_code: Option<String>,

    #[validate(range(min = 16, max = 100, message = "Age must be between 16 and 100"))]
    pub age: Option<i32>,

    pub date_of_birth: Option<NaiveDate>,

    pub gender: Option<Gender>,

    #[validate(length(equal = 11, message = "NIN must be 11 digits"))]
    pub nin: Option<String>,

    #[validate(length(equal = 11, message = "BVN must be 11 digits"))]
    pub bvn: Option<String>,

    #[validate(length(max = 50, message = "At most 50 skills are allowed"))]
    pub skills: Option<Vec<String>>,
}

impl UpdateProfileRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Everything a profile update writes, after uploads have completed.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub fields: UpdateProfileRequest,
    pub avatar: Option<StoredFile>,
    pub resume: Option<StoredFile>,
}

/// Login result. The session token travels in a cookie, so `token` is
/// always `null` in the body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub applicant: ApplicantProfile,
    pub token: Option<String>,
}

/// A stored one-time code.
#[derive(Debug, Clone)]
pub struct OtpCode {
    pub email: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    /// Wrong guesses made against this code.
    pub failed_attempts: i32,
    pub created_at: DateTime<Utc>,
}

impl OtpCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::{FirstName, LastName};
    use fake::Fake;

    fn signup() -> SignupRequest {
        SignupRequest {
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            email: SafeEmail().fake(),
            password: "hunter2".to_string(),
            gender: Gender::Female,
        }
    }

    #[test]
    fn test_signup_valid() {
        assert!(signup().validate().is_ok());
    }

    #[test]
    fn test_signup_short_password() {
        let mut req = signup();
        req.password = "abcd".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_signup_blank_name() {
        let mut req = signup();
        req.first_name = "   ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_signup_rejects_markup_in_name() {
        let mut req = signup();
        req.last_name = r#"<a href="https://phish.test">Bank</a>"#.to_string();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("last_name"));
    }

    #[test]
    fn test_update_rejects_markup_in_name() {
        let req = UpdateProfileRequest {
            first_name: Some("<Ada>".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_signup_bad_email() {
        let mut req = signup();
        req.email = "not-an-email".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_signup_deserializes_camel_case() {
        let req: SignupRequest = serde_json::from_value(serde_json::json!({
            "firstName": "Ada",
            "lastName": "Obi",
            "email": "ada@example.com",
            "password": "secret",
            "gender": "female"
        }))
        .unwrap();
        assert_eq!(req.first_name, "Ada");
        assert_eq!(req.gender, Gender::Female);
    }

    #[test]
    fn test_gender_rejects_unknown() {
        let res: Result<Gender, _> = serde_json::from_str("\"robot\"");
        assert!(res.is_err());
        assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
    }

    #[test]
    fn test_update_profile_phone_validation() {
        let mut req = UpdateProfileRequest {
            phone_number: Some("08012345678".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_ok());

        req.phone_number = Some("12345".to_string());
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_profile_is_empty() {
        assert!(UpdateProfileRequest::default().is_empty());
        let req = UpdateProfileRequest {
            country: Some("Nigeria".to_string()),
            ..Default::default()
        };
        assert!(!req.is_empty());
    }

    #[test]
    fn test_otp_expiry() {
        let now = Utc::now();
        let otp = OtpCode {
            email: "a@b.com".to_string(),
            code_hash: "x".to_string(),
            expires_at: now,
            failed_attempts: 0,
            created_at: now,
        };
        assert!(otp.is_expired(now));
        assert!(!otp.is_expired(now - chrono::Duration::seconds(1)));
    }
}
