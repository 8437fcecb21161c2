//! Request payloads for the certificate endpoints.

use crate::error::{ApiSetuError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Certificate families exposed by the transport gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateKind {
    DrivingLicense,
    VehicleRegistration,
}

impl CertificateKind {
    /// Endpoint path relative to the gateway base URL
    #[must_use]
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::DrivingLicense => "/drvlc/certificate",
            Self::VehicleRegistration => "/rvcer/certificate",
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::DrivingLicense => "Driving License",
            Self::VehicleRegistration => "Vehicle Registration",
        }
    }
}

/// Document format requested from the issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Xml,
    Pdf,
}

impl ResponseFormat {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseFormat {
    type Err = ApiSetuError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "xml" => Ok(Self::Xml),
            "pdf" => Ok(Self::Pdf),
            other => Err(ApiSetuError::Validation(format!(
                "Invalid format '{other}'. Use 'xml' or 'pdf'"
            ))),
        }
    }
}

/// Identifying fields for a driving licence lookup. All optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrivingLicenseParams {
    pub dlno: Option<String>,
    /// Aadhaar number
    pub uid: Option<String>,
    pub full_name: Option<String>,
    /// Date of birth, DD-MM-YYYY
    pub dob: Option<String>,
}

/// Identifying fields for a vehicle registration lookup. All optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleRegistrationParams {
    pub reg_no: Option<String>,
    pub chasis_no: Option<String>,
    /// Owner's Aadhaar number
    pub uid: Option<String>,
    pub full_name: Option<String>,
}

/// Parameters for one verification call; the variant selects the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationParams {
    DrivingLicense(DrivingLicenseParams),
    VehicleRegistration(VehicleRegistrationParams),
}

impl VerificationParams {
    #[must_use]
    pub fn kind(&self) -> CertificateKind {
        match self {
            Self::DrivingLicense(_) => CertificateKind::DrivingLicense,
            Self::VehicleRegistration(_) => CertificateKind::VehicleRegistration,
        }
    }

    /// Supplied identifying fields under their wire names.
    ///
    /// Absent and empty values are left out entirely.
    #[must_use]
    pub fn certificate_parameters(&self) -> Map<String, Value> {
        let fields: [(&str, &Option<String>); 4] = match self {
            Self::DrivingLicense(p) => [
                ("dlno", &p.dlno),
                ("UID", &p.uid),
                ("FullName", &p.full_name),
                ("DOB", &p.dob),
            ],
            Self::VehicleRegistration(p) => [
                ("reg_no", &p.reg_no),
                ("chasis_no", &p.chasis_no),
                ("UID", &p.uid),
                ("FullName", &p.full_name),
            ],
        };

        fields
            .into_iter()
            .filter_map(|(key, value)| match value.as_deref() {
                Some(v) if !v.is_empty() => Some((key.to_string(), Value::String(v.to_string()))),
                _ => None,
            })
            .collect()
    }

    /// True when at least one identifying field was supplied.
    #[must_use]
    pub fn has_identifier(&self) -> bool {
        !self.certificate_parameters().is_empty()
    }
}

/// JSON body POSTed to a certificate endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationPayload {
    pub txn_id: String,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_parameters: Option<Map<String, Value>>,
}

impl VerificationPayload {
    /// Build a payload with a fresh transaction id.
    #[must_use]
    pub fn build(params: &VerificationParams, format: ResponseFormat) -> Self {
        let certificate_parameters = params.certificate_parameters();
        Self {
            txn_id: new_transaction_id(),
            format: format.as_str().to_lowercase(),
            certificate_parameters: (!certificate_parameters.is_empty())
                .then_some(certificate_parameters),
        }
    }
}

/// Random per-request token the gateway uses to correlate request and response.
#[must_use]
pub fn new_transaction_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
