//! School admission portal: applicant accounts, the admission application
//! wizard with staff review, and public content pages.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
