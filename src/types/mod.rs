// src/types/mod.rs
pub mod records;
pub mod response;

pub use records::{Application, CompanyProfile, Job, SearchFilter, UserProfile};
pub use response::{ApplicationsResponse, CompanyResponse, JobsResponse, UserResponse};
