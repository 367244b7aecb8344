//! Bonus proposal models and DTOs

use crate::error::{validation_error, AppError};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

/// Wire format of `proposalDate`
pub const PROPOSAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// `ATS0` followed by three digits; the `000` exclusion is checked separately
static EMPLOYEE_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ATS0[0-9]{3}$").expect("employee id pattern is valid")
});

/// A persisted bonus proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusProposal {
    pub id: i32,
    pub employee_name: String,
    #[serde(rename = "employeeID")]
    pub employee_id: String,
    pub proposal_date: NaiveDate,
    pub bonus_amount: i32,
    pub reason: String,
}

/// A proposal that passed request validation and is ready to insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBonusProposal {
    pub employee_name: String,
    pub employee_id: String,
    pub proposal_date: NaiveDate,
    pub bonus_amount: i32,
    pub reason: String,
}

/// Request body for POST /api/bonuses
///
/// Every field is optional at the serde level so a missing field surfaces
/// as the "all fields required" rule instead of a deserialization error.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBonusRequest {
    #[validate(length(max = 100, message = "employeeName must be at most 100 characters"))]
    pub employee_name: Option<String>,

    #[serde(rename = "employeeID")]
    #[validate(custom(function = "validate_employee_id"))]
    pub employee_id: Option<String>,

    pub proposal_date: Option<String>,

    #[validate(range(min = 100, max = 2147483647, message = "bonusAmount must be at least 100"))]
    pub bonus_amount: Option<i64>,

    pub reason: Option<String>,
}

impl CreateBonusRequest {
    /// Run the ordered request checks and produce an insertable proposal.
    ///
    /// Order: presence, bonus minimum, employee id format, name length,
    /// date format. The first failing rule is reported.
    pub fn into_new_proposal(self) -> Result<NewBonusProposal, AppError> {
        let request = self.normalized();

        let (Some(employee_name), Some(employee_id), Some(proposal_date), Some(bonus_amount), Some(reason)) = (
            request.employee_name.clone(),
            request.employee_id.clone(),
            request.proposal_date.clone(),
            request.bonus_amount,
            request.reason.clone(),
        ) else {
            return Err(validation_error(
                "All fields required: employeeName, employeeID, proposalDate, bonusAmount, reason",
            ));
        };

        if let Err(errors) = request.validate() {
            return Err(first_validation_failure(&errors));
        }

        let proposal_date = NaiveDate::parse_from_str(&proposal_date, PROPOSAL_DATE_FORMAT)
            .map_err(|_| validation_error("proposalDate must be a valid date in YYYY-MM-DD format"))?;

        // Range-validated above
        let bonus_amount = i32::try_from(bonus_amount)
            .map_err(|_| validation_error("bonusAmount is out of range"))?;

        Ok(NewBonusProposal {
            employee_name,
            employee_id,
            proposal_date,
            bonus_amount,
            reason,
        })
    }

    /// Trim text fields and treat blanks (and a zero bonus) as absent
    fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            employee_name: clean(self.employee_name),
            employee_id: clean(self.employee_id),
            proposal_date: clean(self.proposal_date),
            bonus_amount: self.bonus_amount.filter(|amount| *amount != 0),
            reason: clean(self.reason),
        }
    }
}

/// Pick the highest-priority failure out of a validator report
fn first_validation_failure(errors: &ValidationErrors) -> AppError {
    let field_errors = errors.field_errors();

    for field in ["bonus_amount", "employee_id", "employee_name"] {
        if let Some(message) = field_errors
            .get(field)
            .and_then(|errs| errs.first())
            .and_then(|err| err.message.as_ref())
        {
            return validation_error(message.to_string());
        }
    }

    validation_error(errors.to_string())
}

/// Validate the employee id format: `ATS0` plus three digits, never `ATS0000`
fn validate_employee_id(id: &str) -> Result<(), validator::ValidationError> {
    if !is_valid_employee_id(id) {
        let mut err = validator::ValidationError::new("invalid_employee_id");
        err.message = Some(
            "employeeID must be 'ATS0' followed by three digits, excluding 000 (e.g. ATS0123)"
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

pub fn is_valid_employee_id(id: &str) -> bool {
    EMPLOYEE_ID_RE.is_match(id) && !id.ends_with("000")
}

/// Case-insensitive employee name comparison
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Query string for GET /api/bonuses/search
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBonusQuery {
    #[serde(rename = "employeeID")]
    pub employee_id: Option<String>,
    pub employee_name: Option<String>,
}
