//! Pre-built Test Fixtures
//!
//! Ready-to-use drivers, accidents and documents. Values are fixed so
//! assertions can rely on them.

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;

use domain_cid::{AccidentDetails, CidData, InsuranceCompany, PersonInfo};

/// A minimal but well-formed single-page PDF
pub static SAMPLE_PDF: Lazy<Vec<u8>> = Lazy::new(|| sample_pdf("sample"));

/// Builds a small PDF whose bytes, and therefore hash, depend on `tag`
pub fn sample_pdf(tag: &str) -> Vec<u8> {
    format!(
        "%PDF-1.4\n1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n\
         2 0 obj << /Type /Pages /Kids [] /Count 0 >> endobj\n\
         % signed CID {tag}\ntrailer << /Root 1 0 R >>\n%%EOF\n"
    )
    .into_bytes()
}

/// Fixture for drivers
pub struct PersonFixtures;

impl PersonFixtures {
    /// Driver A insured with Allianz
    pub fn allianz_driver() -> PersonInfo {
        Self::driver("Mario", "Rossi", "AB123CD", InsuranceCompany::Allianz, "ALZ-POL-1001")
    }

    /// Driver B insured with Generali
    pub fn generali_driver() -> PersonInfo {
        Self::driver("Laura", "Bianchi", "EF456GH", InsuranceCompany::Generali, "GEN-POL-2002")
    }

    pub fn unipolsai_driver() -> PersonInfo {
        Self::driver("Paolo", "Ferrari", "IJ789KL", InsuranceCompany::UnipolSai, "UNI-POL-3003")
    }

    pub fn axa_driver() -> PersonInfo {
        Self::driver("Chiara", "Romano", "MN012OP", InsuranceCompany::Axa, "AXA-POL-4004")
    }

    /// Any driver insured with the given company
    pub fn insured_with(company: InsuranceCompany) -> PersonInfo {
        match company {
            InsuranceCompany::Allianz => Self::allianz_driver(),
            InsuranceCompany::Generali => Self::generali_driver(),
            InsuranceCompany::UnipolSai => Self::unipolsai_driver(),
            InsuranceCompany::Axa => Self::axa_driver(),
        }
    }

    fn driver(
        name: &str,
        surname: &str,
        plate: &str,
        company: InsuranceCompany,
        policy: &str,
    ) -> PersonInfo {
        PersonInfo {
            name: name.to_string(),
            surname: surname.to_string(),
            license_plate: plate.to_string(),
            insurance_company: company,
            policy_number: policy.to_string(),
        }
    }
}

/// Fixture for accidents
pub struct AccidentFixtures;

impl AccidentFixtures {
    /// Fixed accident time (March 14, 2024 08:30 UTC)
    pub fn accident_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, 8, 30, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Rear-end collision at a traffic light
    pub fn rear_collision() -> AccidentDetails {
        AccidentDetails {
            timestamp: Self::accident_time(),
            location: "Via Roma 12, Milano".to_string(),
            description: "Vehicle B hit vehicle A while stopped at a red light".to_string(),
            circumstances: vec!["stationary".to_string(), "rear_collision".to_string()],
            damage_description: "Rear bumper and tailgate dented".to_string(),
        }
    }
}

/// Fixture for full declarations
pub struct CidFixtures;

impl CidFixtures {
    /// Allianz driver vs Generali driver
    pub fn allianz_generali() -> CidData {
        Self::between(InsuranceCompany::Allianz, InsuranceCompany::Generali)
    }

    /// Declaration between drivers of the two given insurers
    pub fn between(a: InsuranceCompany, b: InsuranceCompany) -> CidData {
        let mut person_b = PersonFixtures::insured_with(b);
        if a == b {
            person_b.name = "Giorgio".to_string();
            person_b.license_plate = "QR345ST".to_string();
        }
        CidData {
            person_a: PersonFixtures::insured_with(a),
            person_b,
            accident_details: AccidentFixtures::rear_collision(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_cid::CidValidator;

    #[test]
    fn test_fixtures_are_valid() {
        for a in InsuranceCompany::ALL {
            for b in InsuranceCompany::ALL {
                let result = CidValidator::validate(&CidFixtures::between(a, b));
                assert!(result.is_valid, "{a}/{b}: {:?}", result.errors);
            }
        }
    }

    #[test]
    fn test_sample_pdfs_differ_by_tag() {
        assert_ne!(sample_pdf("one"), sample_pdf("two"));
        assert!(SAMPLE_PDF.starts_with(b"%PDF"));
    }
}
