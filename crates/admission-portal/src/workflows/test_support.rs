//! In-memory doubles shared by the workflow unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::accounts::{
    AuthCollaborator, AuthFailure, SessionToken, UserAccount, UserId, UserRepository,
};
use crate::workflows::admissions::{
    AdmissionApplication, ApplicationId, ApplicationRepository, DocumentRef, StorageCollaborator,
    StorageError,
};
use crate::workflows::cms::{Page, PageId, PageRepository};
use crate::workflows::persistence::RepositoryError;

pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn account(email: &str, first_name: &str, last_name: &str) -> UserAccount {
    let now = fixed_now();
    UserAccount {
        id: UserId::random(),
        username: email.split('@').next().unwrap_or_default().to_string(),
        email: email.to_string(),
        first_name: first_name.to_string(),
        middle_name: None,
        last_name: last_name.to_string(),
        phone_number: None,
        profile_completed: false,
        is_staff: false,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn staff(email: &str) -> UserAccount {
    let mut admin = account(email, "Grace", "Okafor");
    admin.is_staff = true;
    admin
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[derive(Default, Clone)]
pub(crate) struct MemoryUsers {
    pub(crate) records: Arc<Mutex<HashMap<UserId, UserAccount>>>,
}

impl MemoryUsers {
    pub(crate) fn with(users: &[UserAccount]) -> Self {
        let repository = Self::default();
        for user in users {
            repository.insert(user.clone()).expect("seed user");
        }
        repository
    }
}

impl UserRepository for MemoryUsers {
    fn insert(&self, user: UserAccount) -> Result<UserAccount, RepositoryError> {
        let mut guard = self.records.lock().expect("users mutex poisoned");
        if guard.values().any(|existing| existing.email == user.email) {
            return Err(RepositoryError::Conflict { field: "email" });
        }
        if guard.values().any(|existing| existing.username == user.username) {
            return Err(RepositoryError::Conflict { field: "username" });
        }
        guard.insert(user.id, user.clone());
        Ok(user)
    }

    fn update(&self, user: UserAccount) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("users mutex poisoned");
        guard.insert(user.id, user);
        Ok(())
    }

    fn fetch(&self, id: &UserId) -> Result<Option<UserAccount>, RepositoryError> {
        let guard = self.records.lock().expect("users mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, RepositoryError> {
        let guard = self.records.lock().expect("users mutex poisoned");
        Ok(guard.values().find(|user| user.email == email).cloned())
    }

    fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, RepositoryError> {
        let guard = self.records.lock().expect("users mutex poisoned");
        Ok(guard.values().find(|user| user.username == username).cloned())
    }

    fn remove(&self, id: &UserId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("users mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn all(&self) -> Result<Vec<UserAccount>, RepositoryError> {
        let guard = self.records.lock().expect("users mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct MemoryAuth {
    credentials: Arc<Mutex<HashMap<String, (UserId, String)>>>,
    sessions: Arc<Mutex<HashMap<String, UserId>>>,
    sequence: Arc<AtomicU64>,
    offline: Arc<AtomicBool>,
}

impl MemoryAuth {
    pub(crate) fn session_for(&self, user: &UserAccount) -> SessionToken {
        self.create_session(user).expect("session created")
    }

    /// While offline, credential storage and session lookups report `Unavailable`.
    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), AuthFailure> {
        if self.offline.load(Ordering::SeqCst) {
            Err(AuthFailure::Unavailable("auth backend offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl AuthCollaborator for MemoryAuth {
    fn store_credentials(&self, user: &UserAccount, password: &str) -> Result<(), AuthFailure> {
        self.ensure_online()?;
        self.credentials
            .lock()
            .expect("auth mutex poisoned")
            .insert(user.username.clone(), (user.id, password.to_string()));
        Ok(())
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<UserId, AuthFailure> {
        let guard = self.credentials.lock().expect("auth mutex poisoned");
        match guard.get(username) {
            Some((id, stored)) if stored == password => Ok(*id),
            _ => Err(AuthFailure::InvalidCredentials),
        }
    }

    fn create_session(&self, user: &UserAccount) -> Result<SessionToken, AuthFailure> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let token = format!("session-{sequence}");
        self.sessions
            .lock()
            .expect("auth mutex poisoned")
            .insert(token.clone(), user.id);
        Ok(SessionToken(token))
    }

    fn destroy_session(&self, token: &SessionToken) -> Result<(), AuthFailure> {
        self.sessions
            .lock()
            .expect("auth mutex poisoned")
            .remove(&token.0)
            .map(|_| ())
            .ok_or(AuthFailure::UnknownSession)
    }

    fn current_user(&self, token: &SessionToken) -> Result<Option<UserId>, AuthFailure> {
        self.ensure_online()?;
        Ok(self
            .sessions
            .lock()
            .expect("auth mutex poisoned")
            .get(&token.0)
            .copied())
    }
}

#[derive(Default, Clone)]
pub(crate) struct MemoryApplications {
    pub(crate) records: Arc<Mutex<HashMap<ApplicationId, AdmissionApplication>>>,
}

impl MemoryApplications {
    pub(crate) fn len(&self) -> usize {
        self.records.lock().expect("applications mutex poisoned").len()
    }
}

impl ApplicationRepository for MemoryApplications {
    fn insert(
        &self,
        application: AdmissionApplication,
    ) -> Result<AdmissionApplication, RepositoryError> {
        let mut guard = self.records.lock().expect("applications mutex poisoned");
        if guard
            .values()
            .any(|existing| existing.user_id == application.user_id)
        {
            return Err(RepositoryError::Conflict { field: "user_id" });
        }
        if guard
            .values()
            .any(|existing| existing.registration_number == application.registration_number)
        {
            return Err(RepositoryError::Conflict {
                field: "registration_number",
            });
        }
        guard.insert(application.id, application.clone());
        Ok(application)
    }

    fn update(&self, application: AdmissionApplication) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("applications mutex poisoned");
        if !guard.contains_key(&application.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(application.id, application);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<AdmissionApplication>, RepositoryError> {
        let guard = self.records.lock().expect("applications mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn fetch_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<AdmissionApplication>, RepositoryError> {
        let guard = self.records.lock().expect("applications mutex poisoned");
        Ok(guard
            .values()
            .find(|application| application.user_id == *user_id)
            .cloned())
    }

    fn all(&self) -> Result<Vec<AdmissionApplication>, RepositoryError> {
        let guard = self.records.lock().expect("applications mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct MemoryStorage {
    pub(crate) objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub(crate) fn contains(&self, reference: &DocumentRef) -> bool {
        self.objects
            .lock()
            .expect("storage mutex poisoned")
            .contains_key(&reference.0)
    }

    pub(crate) fn len(&self) -> usize {
        self.objects.lock().expect("storage mutex poisoned").len()
    }
}

impl StorageCollaborator for MemoryStorage {
    fn store(&self, bytes: &[u8], generated_name: &str) -> Result<DocumentRef, StorageError> {
        self.objects
            .lock()
            .expect("storage mutex poisoned")
            .insert(generated_name.to_string(), bytes.to_vec());
        Ok(DocumentRef(generated_name.to_string()))
    }

    fn delete(&self, reference: &DocumentRef) -> Result<(), StorageError> {
        self.objects
            .lock()
            .expect("storage mutex poisoned")
            .remove(&reference.0);
        Ok(())
    }
}

/// Storage double whose backend is always down.
pub(crate) struct OfflineStorage;

impl StorageCollaborator for OfflineStorage {
    fn store(&self, _bytes: &[u8], _generated_name: &str) -> Result<DocumentRef, StorageError> {
        Err(StorageError::Unavailable("bucket offline".to_string()))
    }

    fn delete(&self, _reference: &DocumentRef) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("bucket offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(crate) struct MemoryPages {
    pub(crate) records: Arc<Mutex<HashMap<PageId, Page>>>,
}

impl PageRepository for MemoryPages {
    fn insert(&self, page: Page) -> Result<Page, RepositoryError> {
        let mut guard = self.records.lock().expect("pages mutex poisoned");
        if guard.values().any(|existing| existing.slug == page.slug) {
            return Err(RepositoryError::Conflict { field: "slug" });
        }
        guard.insert(page.id, page.clone());
        Ok(page)
    }

    fn update(&self, page: Page) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("pages mutex poisoned");
        if !guard.contains_key(&page.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(page.id, page);
        Ok(())
    }

    fn find_by_slug(&self, slug: &str) -> Result<Option<Page>, RepositoryError> {
        let guard = self.records.lock().expect("pages mutex poisoned");
        Ok(guard.values().find(|page| page.slug == slug).cloned())
    }

    fn all(&self) -> Result<Vec<Page>, RepositoryError> {
        let guard = self.records.lock().expect("pages mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}
