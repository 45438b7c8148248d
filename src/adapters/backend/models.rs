//! Request and error bodies of the XDS document generator

use crate::core::mapping::LaboratoryReport;
use crate::domain::Patient;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    pub person_given_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub person_sur_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    pub street_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub post_code_identifier: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub municipality_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    pub phone_number_identifier: String,

    /// "W" for work/general use
    pub phone_number_use: String,
}

/// Patient demographics as the generator expects them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citizen {
    /// National civil registration number
    pub person_civil_registration_identifier: String,

    #[serde(
        rename = "personNameStructure",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<PersonName>,

    #[serde(rename = "addressPostal", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<PostalAddress>,

    #[serde(
        rename = "phoneNumberSubscriber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<PhoneNumber>,
}

impl From<&Patient> for Citizen {
    fn from(patient: &Patient) -> Self {
        let name = (!patient.first_name.is_empty()).then(|| PersonName {
            person_given_name: patient.first_name.clone(),
            person_sur_name: patient.last_name.clone(),
        });

        let address = (!patient.address.is_empty()).then(|| PostalAddress {
            street_name: patient.address.clone(),
            post_code_identifier: patient.postal_code.clone(),
            municipality_name: patient.city.clone(),
        });

        let phone = (!patient.mobile_phone.is_empty()).then(|| PhoneNumber {
            phone_number_identifier: patient.mobile_phone.clone(),
            phone_number_use: "W".to_string(),
        });

        Self {
            person_civil_registration_identifier: patient.unique_id.clone(),
            name,
            address,
            phone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SelfMonitoringSample {
    pub created_by_text: String,
    pub laboratory_reports: Vec<LaboratoryReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SampleEntry {
    pub self_monitoring_sample: SelfMonitoringSample,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SelfMonitoringCollection {
    pub citizen: Citizen,
    pub self_monitoring_samples: Vec<SampleEntry>,
}

/// Request body posted to the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XdsGeneratorRequest {
    #[serde(rename = "DocumentUUID")]
    pub document_uuid: Uuid,
    pub self_monitoring_collection: Vec<SelfMonitoringCollection>,
}

impl XdsGeneratorRequest {
    /// One document holding one sample for one citizen
    pub fn new(
        document_uuid: Uuid,
        patient: &Patient,
        created_by: &str,
        reports: Vec<LaboratoryReport>,
    ) -> Self {
        Self {
            document_uuid,
            self_monitoring_collection: vec![SelfMonitoringCollection {
                citizen: Citizen::from(patient),
                self_monitoring_samples: vec![SampleEntry {
                    self_monitoring_sample: SelfMonitoringSample {
                        created_by_text: created_by.to_string(),
                        laboratory_reports: reports,
                    },
                }],
            }],
        }
    }
}

/// Error body returned by the generator
#[derive(Debug, Clone, Default, Deserialize)]
pub struct XdsErrorResponse {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient() -> Patient {
        Patient {
            unique_id: "2512484916".to_string(),
            first_name: "Nancy".to_string(),
            last_name: "Berggren".to_string(),
            address: "Testvej 1".to_string(),
            postal_code: "8000".to_string(),
            city: "Aarhus C".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_citizen_from_patient() {
        let citizen = Citizen::from(&patient());
        assert_eq!(citizen.person_civil_registration_identifier, "2512484916");
        assert_eq!(citizen.name.unwrap().person_sur_name, "Berggren");
        assert_eq!(citizen.address.unwrap().municipality_name, "Aarhus C");
        assert!(citizen.phone.is_none());
    }

    #[test]
    fn test_request_shape() {
        let id = Uuid::new_v4();
        let request = XdsGeneratorRequest::new(id, &patient(), "Telemedicine", vec![]);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["DocumentUUID"], id.to_string());
        let collection = &json["SelfMonitoringCollection"][0];
        assert_eq!(
            collection["Citizen"]["personNameStructure"]["personGivenName"],
            "Nancy"
        );
        assert_eq!(collection["Citizen"]["addressPostal"]["postCodeIdentifier"], "8000");
        assert!(collection["Citizen"].get("phoneNumberSubscriber").is_none());
        assert_eq!(
            collection["SelfMonitoringSamples"][0]["SelfMonitoringSample"]["CreatedByText"],
            "Telemedicine"
        );
    }

    #[test]
    fn test_anonymous_patient_has_only_identifier() {
        let patient = Patient {
            unique_id: "0101010101".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(Citizen::from(&patient)).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_error_body() {
        let body = r#"{"timestamp":"2024-03-01T08:00:00Z","status":400,"error":"Bad Request","message":"Missing CPR","path":"/generate"}"#;
        let parsed: XdsErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.message, "Missing CPR");
        assert_eq!(parsed.status, Some(400));
    }
}
