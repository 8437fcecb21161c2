//! Client for the APIsetu transport gateway: driving licence and vehicle
//! registration certificate verification, plus local credential storage.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
#[macro_use]
pub mod output;
pub mod request;

// Re-export common types
pub use api::{VerificationClient, VerificationResult, map_status_to_error};
pub use config::{
    CredentialStore, Credentials, EnvOverride, FileCredentialStore, MemoryCredentialStore, Setting,
};
pub use error::{ApiSetuError, Result};
pub use request::{
    CertificateKind, DrivingLicenseParams, ResponseFormat, VehicleRegistrationParams,
    VerificationParams, VerificationPayload,
};
