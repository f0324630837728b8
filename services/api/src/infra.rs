use admission_portal::error::AppError;
use admission_portal::workflows::accounts::{
    AccountService, AuthCollaborator, AuthFailure, Registration, SessionToken, UserAccount,
    UserId, UserRepository,
};
use admission_portal::workflows::admissions::{
    AdmissionApplication, AdmissionPolicy, AdmissionService, ApplicationId, ApplicationRepository,
    DocumentRef, ReviewService, StorageCollaborator, StorageError,
};
use admission_portal::workflows::cms::{ContentService, Page, PageId, PageRepository};
use admission_portal::workflows::RepositoryError;
use metrics_exporter_prometheus::PrometheusHandle;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;
use uuid::Uuid;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type PortalAccounts = AccountService<InMemoryUserRepository, InMemoryAuth>;
pub(crate) type PortalAdmissions = AdmissionService<InMemoryApplicationRepository, InMemoryStorage>;
pub(crate) type PortalReview = ReviewService<InMemoryApplicationRepository, InMemoryUserRepository>;
pub(crate) type PortalContent = ContentService<InMemoryPageRepository>;

/// Every portal service wired to the in-memory adapters.
#[derive(Clone)]
pub(crate) struct PortalServices {
    pub(crate) accounts: Arc<PortalAccounts>,
    pub(crate) admissions: Arc<PortalAdmissions>,
    pub(crate) review: Arc<PortalReview>,
    pub(crate) content: Arc<PortalContent>,
    pub(crate) storage: InMemoryStorage,
}

impl PortalServices {
    pub(crate) fn in_memory(policy: AdmissionPolicy) -> Self {
        let users = Arc::new(InMemoryUserRepository::default());
        let auth = Arc::new(InMemoryAuth::default());
        let applications = Arc::new(InMemoryApplicationRepository::default());
        let storage = InMemoryStorage::default();
        let pages = Arc::new(InMemoryPageRepository::default());

        Self {
            accounts: Arc::new(AccountService::new(users.clone(), auth)),
            admissions: Arc::new(AdmissionService::new(
                applications.clone(),
                Arc::new(storage.clone()),
                policy,
            )),
            review: Arc::new(ReviewService::new(applications, users)),
            content: Arc::new(ContentService::new(pages)),
            storage,
        }
    }

    /// Register an account and grant it staff access.
    pub(crate) fn bootstrap_staff(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserAccount, AppError> {
        let registration = Registration {
            first_name: "Portal".to_string(),
            middle_name: None,
            last_name: "Administrator".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password_confirmation: password.to_string(),
            username: None,
        };
        let account = self.accounts.register(registration)?;
        Ok(self.accounts.grant_staff(&account.id)?)
    }
}

fn locked<'a, T>(mutex: &'a Mutex<T>, store: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{store} lock poisoned")))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryUserRepository {
    records: Arc<Mutex<HashMap<UserId, UserAccount>>>,
}

impl UserRepository for InMemoryUserRepository {
    fn insert(&self, user: UserAccount) -> Result<UserAccount, RepositoryError> {
        let mut guard = locked(&self.records, "users")?;
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
        let mut guard = locked(&self.records, "users")?;
        if guard.contains_key(&user.id) {
            guard.insert(user.id, user);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &UserId) -> Result<Option<UserAccount>, RepositoryError> {
        Ok(locked(&self.records, "users")?.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, RepositoryError> {
        let guard = locked(&self.records, "users")?;
        Ok(guard.values().find(|user| user.email == email).cloned())
    }

    fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, RepositoryError> {
        let guard = locked(&self.records, "users")?;
        Ok(guard.values().find(|user| user.username == username).cloned())
    }

    fn remove(&self, id: &UserId) -> Result<(), RepositoryError> {
        locked(&self.records, "users")?
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn all(&self) -> Result<Vec<UserAccount>, RepositoryError> {
        Ok(locked(&self.records, "users")?.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, AdmissionApplication>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(
        &self,
        application: AdmissionApplication,
    ) -> Result<AdmissionApplication, RepositoryError> {
        let mut guard = locked(&self.records, "applications")?;
        if guard
            .values()
            .any(|existing| existing.user_id() == application.user_id())
        {
            return Err(RepositoryError::Conflict { field: "user_id" });
        }
        if guard
            .values()
            .any(|existing| existing.registration_number() == application.registration_number())
        {
            return Err(RepositoryError::Conflict {
                field: "registration_number",
            });
        }
        guard.insert(application.id(), application.clone());
        Ok(application)
    }

    fn update(&self, application: AdmissionApplication) -> Result<(), RepositoryError> {
        let mut guard = locked(&self.records, "applications")?;
        if guard.contains_key(&application.id()) {
            guard.insert(application.id(), application);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<AdmissionApplication>, RepositoryError> {
        Ok(locked(&self.records, "applications")?.get(id).cloned())
    }

    fn fetch_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<AdmissionApplication>, RepositoryError> {
        let guard = locked(&self.records, "applications")?;
        Ok(guard
            .values()
            .find(|application| application.user_id() == *user_id)
            .cloned())
    }

    fn all(&self) -> Result<Vec<AdmissionApplication>, RepositoryError> {
        Ok(locked(&self.records, "applications")?
            .values()
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPageRepository {
    records: Arc<Mutex<HashMap<PageId, Page>>>,
}

impl PageRepository for InMemoryPageRepository {
    fn insert(&self, page: Page) -> Result<Page, RepositoryError> {
        let mut guard = locked(&self.records, "pages")?;
        if guard.values().any(|existing| existing.slug == page.slug) {
            return Err(RepositoryError::Conflict { field: "slug" });
        }
        guard.insert(page.id, page.clone());
        Ok(page)
    }

    fn update(&self, page: Page) -> Result<(), RepositoryError> {
        let mut guard = locked(&self.records, "pages")?;
        if guard.contains_key(&page.id) {
            guard.insert(page.id, page);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn find_by_slug(&self, slug: &str) -> Result<Option<Page>, RepositoryError> {
        let guard = locked(&self.records, "pages")?;
        Ok(guard.values().find(|page| page.slug == slug).cloned())
    }

    fn all(&self) -> Result<Vec<Page>, RepositoryError> {
        Ok(locked(&self.records, "pages")?.values().cloned().collect())
    }
}

struct Credential {
    user_id: UserId,
    salt: String,
    digest: String,
}

/// Process-local credential store. Passwords are kept as salted SHA-256 digests.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAuth {
    credentials: Arc<Mutex<HashMap<String, Credential>>>,
    sessions: Arc<Mutex<HashMap<String, UserId>>>,
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn unavailable<T>(_: T) -> AuthFailure {
    AuthFailure::Unavailable("credential store lock poisoned".to_string())
}

impl AuthCollaborator for InMemoryAuth {
    fn store_credentials(&self, user: &UserAccount, password: &str) -> Result<(), AuthFailure> {
        let salt = Uuid::new_v4().simple().to_string();
        let credential = Credential {
            user_id: user.id,
            digest: password_digest(&salt, password),
            salt,
        };
        self.credentials
            .lock()
            .map_err(unavailable)?
            .insert(user.username.clone(), credential);
        Ok(())
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<UserId, AuthFailure> {
        let guard = self.credentials.lock().map_err(unavailable)?;
        match guard.get(username) {
            Some(credential) if password_digest(&credential.salt, password) == credential.digest => {
                Ok(credential.user_id)
            }
            _ => Err(AuthFailure::InvalidCredentials),
        }
    }

    fn create_session(&self, user: &UserAccount) -> Result<SessionToken, AuthFailure> {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions
            .lock()
            .map_err(unavailable)?
            .insert(token.clone(), user.id);
        Ok(SessionToken(token))
    }

    fn destroy_session(&self, token: &SessionToken) -> Result<(), AuthFailure> {
        self.sessions
            .lock()
            .map_err(unavailable)?
            .remove(&token.0)
            .map(|_| ())
            .ok_or(AuthFailure::UnknownSession)
    }

    fn current_user(&self, token: &SessionToken) -> Result<Option<UserId>, AuthFailure> {
        let guard = self.sessions.lock().map_err(|poisoned| {
            warn!("session store lock poisoned");
            unavailable(poisoned)
        })?;
        Ok(guard.get(&token.0).copied())
    }
}

/// Document bytes held in memory, keyed by generated name.
#[derive(Default, Clone)]
pub(crate) struct InMemoryStorage {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryStorage {
    pub(crate) fn object_count(&self) -> usize {
        self.objects.lock().map(|guard| guard.len()).unwrap_or_default()
    }
}

impl StorageCollaborator for InMemoryStorage {
    fn store(&self, bytes: &[u8], generated_name: &str) -> Result<DocumentRef, StorageError> {
        self.objects
            .lock()
            .map_err(|_| StorageError::Unavailable("object store lock poisoned".to_string()))?
            .insert(generated_name.to_string(), bytes.to_vec());
        Ok(DocumentRef(generated_name.to_string()))
    }

    fn delete(&self, reference: &DocumentRef) -> Result<(), StorageError> {
        self.objects
            .lock()
            .map_err(|_| StorageError::Unavailable("object store lock poisoned".to_string()))?
            .remove(&reference.0)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}
