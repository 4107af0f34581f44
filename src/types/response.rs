use serde::{Deserialize, Deserializer, Serialize};

use crate::types::records::{Application, CompanyProfile, Job, UserProfile};

// ===== Backend Response Envelopes =====
//
// Every endpoint answers `{ success, <payload>?, message? }`.

/// Absent and `null` both decode to the empty value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobsResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub jobs: Vec<Job>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompanyResponse {
    pub success: bool,
    pub company: Option<CompanyProfile>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: Option<UserProfile>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApplicationsResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub applications: Vec<Application>,
    pub message: Option<String>,
}
