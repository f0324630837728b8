use std::sync::Arc;

use crate::workflows::accounts::domain::Registration;
use crate::workflows::accounts::service::AccountService;
use crate::workflows::test_support::{MemoryAuth, MemoryUsers};

pub(super) fn registration(email: &str) -> Registration {
    Registration {
        first_name: "Ada".to_string(),
        middle_name: Some("Ngozi".to_string()),
        last_name: "Obi".to_string(),
        email: email.to_string(),
        password: "admit2025".to_string(),
        password_confirmation: "admit2025".to_string(),
        username: None,
    }
}

pub(super) fn build_service() -> (
    AccountService<MemoryUsers, MemoryAuth>,
    Arc<MemoryUsers>,
    Arc<MemoryAuth>,
) {
    let users = Arc::new(MemoryUsers::default());
    let auth = Arc::new(MemoryAuth::default());
    let service = AccountService::new(users.clone(), auth.clone());
    (service, users, auth)
}
