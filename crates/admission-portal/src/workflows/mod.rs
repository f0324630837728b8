pub mod accounts;
pub mod admissions;
pub mod cms;
pub mod outcome;
pub mod persistence;

#[cfg(test)]
pub(crate) mod test_support;

pub use outcome::ActionOutcome;
pub use persistence::RepositoryError;
