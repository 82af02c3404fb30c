//! Work experience models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Internship,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full-time",
            EmploymentType::PartTime => "part-time",
            EmploymentType::Contract => "contract",
            EmploymentType::Internship => "internship",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkType {
    Remote,
    OnSite,
    Hybrid,
}

impl WorkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkType::Remote => "remote",
            WorkType::OnSite => "on-site",
            WorkType::Hybrid => "hybrid",
        }
    }
}

/// A stored work experience entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperience {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub job_title: String,
    pub employment_type: EmploymentType,
    pub company: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub location: String,
    pub work_type: WorkType,
    pub description: String,
    pub currently_working: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkExperience {
    /// Applies a validated patch. Setting `currentlyWorking` clears the end date.
    pub fn apply(&mut self, patch: &UpdateWorkExperienceRequest) {
        if let Some(v) = &patch.job_title {
            self.job_title = v.clone();
        }
        if let Some(v) = patch.employment_type {
            self.employment_type = v;
        }
        if let Some(v) = &patch.company {
            self.company = v.clone();
        }
        if let Some(v) = patch.start_date {
            self.start_date = v;
        }
        if let Some(v) = patch.end_date {
            self.end_date = Some(v);
        }
        if let Some(v) = &patch.location {
            self.location = v.clone();
        }
        if let Some(v) = patch.work_type {
            self.work_type = v;
        }
        if let Some(v) = &patch.description {
            self.description = v.clone();
        }
        if let Some(v) = patch.currently_working {
            self.currently_working = v;
            if v {
                self.end_date = None;
            }
        }
    }
}

/// One entry of an add request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_entry_period"))]
pub struct WorkExperienceInput {
    #[validate(length(min = 2, max = 100, message = "Job title must be 2-100 characters"))]
    pub job_title: String,

    pub employment_type: EmploymentType,

    #[validate(length(min = 2, max = 100, message = "Company must be 2-100 characters"))]
    pub company: String,

    pub start_date: NaiveDate,

    pub end_date: Option<NaiveDate>,

    #[validate(length(min = 2, max = 100, message = "Location must be 2-100 characters"))]
    pub location: String,

    pub work_type: WorkType,

    #[validate(length(min = 10, max = 500, message = "Description must be 10-500 characters"))]
    pub description: String,

    #[serde(default)]
    pub currently_working: bool,
}

fn validate_entry_period(entry: &WorkExperienceInput) -> Result<(), ValidationError> {
    match (entry.currently_working, entry.end_date) {
        (true, Some(_)) => Err(period_error(
            "current_with_end_date",
            "endDate must be empty when currentlyWorking is true",
        )),
        (false, None) => Err(period_error(
            "missing_end_date",
            "Either endDate or currentlyWorking is required",
        )),
        (_, Some(end)) if end < entry.start_date => Err(period_error(
            "end_before_start",
            "endDate cannot be before startDate",
        )),
        _ => Ok(()),
    }
}

fn period_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Body of `POST /applicants/work-experience`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddWorkExperienceRequest {
    #[validate(
        length(min = 1, max = 20, message = "Provide between 1 and 20 entries"),
        nested
    )]
    pub work_experience: Vec<WorkExperienceInput>,
}

/// Partial update. Cross-field rules are checked against the stored entry.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkExperienceRequest {
    #[validate(length(min = 2, max = 100, message = "Job title must be 2-100 characters"))]
    pub job_title: Option<String>,

    pub employment_type: Option<EmploymentType>,

    #[validate(length(min = 2, max = 100, message = "Company must be 2-100 characters"))]
    pub company: Option<String>,

    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,

    #[validate(length(min = 2, max = 100, message = "Location must be 2-100 characters"))]
    pub location: Option<String>,

    pub work_type: Option<WorkType>,

    #[validate(length(min = 10, max = 500, message = "Description must be 10-500 characters"))]
    pub description: Option<String>,

    pub currently_working: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input() -> WorkExperienceInput {
        WorkExperienceInput {
            job_title: "Backend Engineer".to_string(),
            employment_type: EmploymentType::FullTime,
            company: "Paystack".to_string(),
            start_date: date(2021, 1, 4),
            end_date: Some(date(2023, 6, 30)),
            location: "Lagos".to_string(),
            work_type: WorkType::Hybrid,
            description: "Built payment reconciliation services".to_string(),
            currently_working: false,
        }
    }

    fn stored() -> WorkExperience {
        let now = Utc::now();
        WorkExperience {
            id: Uuid::new_v4(),
            applicant_id: Uuid::new_v4(),
            job_title: "Analyst".to_string(),
            employment_type: EmploymentType::Contract,
            company: "Flutterwave".to_string(),
            start_date: date(2020, 1, 1),
            end_date: Some(date(2020, 12, 31)),
            location: "Abuja".to_string(),
            work_type: WorkType::OnSite,
            description: "Reporting and dashboards".to_string(),
            currently_working: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_input_valid() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_input_current_without_end_date() {
        let mut i = input();
        i.currently_working = true;
        i.end_date = None;
        assert!(i.validate().is_ok());
    }

    #[test]
    fn test_input_current_with_end_date_rejected() {
        let mut i = input();
        i.currently_working = true;
        assert!(i.validate().is_err());
    }

    #[test]
    fn test_input_neither_rejected() {
        let mut i = input();
        i.end_date = None;
        assert!(i.validate().is_err());
    }

    #[test]
    fn test_input_end_before_start_rejected() {
        let mut i = input();
        i.end_date = Some(date(2020, 1, 1));
        assert!(i.validate().is_err());
    }

    #[test]
    fn test_input_short_description_rejected() {
        let mut i = input();
        i.description = "short".to_string();
        assert!(i.validate().is_err());
    }

    #[test]
    fn test_add_request_nested_validation() {
        let mut bad = input();
        bad.job_title = "X".to_string();
        let req = AddWorkExperienceRequest {
            work_experience: vec![input(), bad],
        };
        assert!(req.validate().is_err());

        let empty = AddWorkExperienceRequest {
            work_experience: vec![],
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_enum_wire_names() {
        let i: WorkExperienceInput = serde_json::from_value(serde_json::json!({
            "jobTitle": "QA Engineer",
            "employmentType": "part-time",
            "company": "Andela",
            "startDate": "2022-02-01",
            "location": "Remote",
            "workType": "on-site",
            "description": "Test automation for web apps",
            "currentlyWorking": true
        }))
        .unwrap();
        assert_eq!(i.employment_type, EmploymentType::PartTime);
        assert_eq!(i.work_type, WorkType::OnSite);
        assert_eq!(WorkType::OnSite.as_str(), "on-site");
    }

    #[test]
    fn test_apply_currently_working_clears_end_date() {
        let mut w = stored();
        w.apply(&UpdateWorkExperienceRequest {
            currently_working: Some(true),
            ..Default::default()
        });
        assert!(w.currently_working);
        assert_eq!(w.end_date, None);
    }

    #[test]
    fn test_apply_partial_fields() {
        let mut w = stored();
        w.apply(&UpdateWorkExperienceRequest {
            company: Some("Kuda".to_string()),
            work_type: Some(WorkType::Remote),
            ..Default::default()
        });
        assert_eq!(w.company, "Kuda");
        assert_eq!(w.work_type, WorkType::Remote);
        assert_eq!(w.job_title, "Analyst");
    }
}
