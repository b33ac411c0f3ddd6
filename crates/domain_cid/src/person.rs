//! Drivers and their insurers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::CoreError;

/// Insurance companies the system can dispatch to
///
/// This is a closed set. Supporting a new insurer means adding a variant here and
/// registering an adapter for it; dispatch and aggregation stay untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsuranceCompany {
    Allianz,
    #[serde(rename = "unipolsai")]
    UnipolSai,
    Generali,
    Axa,
}

impl InsuranceCompany {
    /// Every supported insurer, in declaration order
    pub const ALL: [InsuranceCompany; 4] = [
        InsuranceCompany::Allianz,
        InsuranceCompany::UnipolSai,
        InsuranceCompany::Generali,
        InsuranceCompany::Axa,
    ];

    /// Wire name of the insurer
    pub fn as_str(&self) -> &'static str {
        match self {
            InsuranceCompany::Allianz => "allianz",
            InsuranceCompany::UnipolSai => "unipolsai",
            InsuranceCompany::Generali => "generali",
            InsuranceCompany::Axa => "axa",
        }
    }

    /// Human-facing brand name
    pub fn display_name(&self) -> &'static str {
        match self {
            InsuranceCompany::Allianz => "Allianz",
            InsuranceCompany::UnipolSai => "UnipolSai",
            InsuranceCompany::Generali => "Generali",
            InsuranceCompany::Axa => "AXA",
        }
    }
}

impl fmt::Display for InsuranceCompany {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InsuranceCompany {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InsuranceCompany::ALL
            .into_iter()
            .find(|company| company.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::validation(format!("unsupported insurance company: {s}")))
    }
}

/// One driver involved in the accident
///
/// Length limits are enforced here; blank checks live in
/// [`crate::validation::CidValidator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PersonInfo {
    /// Given name
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub name: String,
    /// Family name
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub surname: String,
    /// Vehicle registration plate
    #[validate(length(max = 10, message = "must be at most 10 characters"))]
    pub license_plate: String,
    /// Insurer covering this driver's vehicle
    pub insurance_company: InsuranceCompany,
    /// Policy number at that insurer
    #[validate(length(max = 50, message = "must be at most 50 characters"))]
    pub policy_number: String,
}
