//! Service graph construction and the merged `/api/v1` router.

use std::sync::Arc;

use axum::{Extension, Router};

use crate::audit::{AuditRepository, AuditTrail};
use crate::auth::{auth_router, AuthService, Authenticator, Mailer, PasswordHasher, TokenIssuer};
use crate::billing::{billing_router, BillingRepository, BillingService, PlanCatalog};
use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::jobs::{jobs_router, ApplicationRepository, JobRepository, JobService};
use crate::messages::{messages_router, MessageRepository, MessageService};
use crate::permissions::{permissions_router, PermissionRepository, PermissionService};
use crate::profiles::{profiles_router, ProfileRepository, ProfileService};
use crate::search::{search_router, MemorySearchIndex, SearchIndex, SearchService};
use crate::store::MemoryStore;
use crate::users::{users_router, UserRepository, UserService};

/// One handle per storage seam.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub permissions: Arc<dyn PermissionRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub billing: Arc<dyn BillingRepository>,
    pub audit: Arc<dyn AuditRepository>,
}

impl Repositories {
    /// Every seam served by one shared `MemoryStore`.
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }

    pub fn from_store(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            profiles: store.clone(),
            jobs: store.clone(),
            applications: store.clone(),
            permissions: store.clone(),
            messages: store.clone(),
            billing: store.clone(),
            audit: store,
        }
    }
}

/// External collaborators injected into the service graph.
#[derive(Clone)]
pub struct AppDependencies {
    pub repositories: Repositories,
    pub search_index: Arc<dyn SearchIndex>,
    pub mailer: Arc<dyn Mailer>,
    pub clock: Arc<dyn Clock>,
    pub catalog: Arc<PlanCatalog>,
}

impl AppDependencies {
    /// In-memory storage and search with the standard plan catalog.
    pub fn in_memory(mailer: Arc<dyn Mailer>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repositories: Repositories::in_memory(),
            search_index: Arc::new(MemorySearchIndex::default()),
            mailer,
            clock,
            catalog: Arc::new(PlanCatalog::standard()),
        }
    }
}

#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub profiles: Arc<ProfileService>,
    pub jobs: Arc<JobService>,
    pub permissions: Arc<PermissionService>,
    pub messages: Arc<MessageService>,
    pub billing: Arc<BillingService>,
    pub search: SearchService,
    pub authenticator: Arc<Authenticator>,
}

impl AppServices {
    pub fn build(config: &AuthConfig, deps: AppDependencies) -> Self {
        let AppDependencies {
            repositories: repos,
            search_index,
            mailer,
            clock,
            catalog,
        } = deps;

        let audit = AuditTrail::new(repos.audit.clone(), clock.clone());
        let hasher = PasswordHasher::new(config.password_iterations);
        let tokens = Arc::new(TokenIssuer::new(
            &config.jwt_secret,
            config.token_ttl,
            clock.clone(),
        ));
        let search = SearchService::new(search_index);

        let billing = Arc::new(BillingService::new(
            repos.billing.clone(),
            catalog,
            audit.clone(),
            clock.clone(),
        ));
        let profiles = Arc::new(ProfileService::new(
            repos.profiles.clone(),
            repos.permissions.clone(),
            search.clone(),
            audit.clone(),
            clock.clone(),
        ));
        let permissions = Arc::new(PermissionService::new(
            repos.permissions.clone(),
            repos.profiles.clone(),
            billing.clone(),
            audit.clone(),
            clock.clone(),
        ));
        let jobs = Arc::new(JobService::new(
            repos.jobs.clone(),
            repos.applications.clone(),
            repos.profiles.clone(),
            billing.clone(),
            search.clone(),
            audit.clone(),
            clock.clone(),
        ));
        let messages = Arc::new(MessageService::new(
            repos.messages.clone(),
            repos.users.clone(),
            permissions.clone(),
            audit.clone(),
            clock.clone(),
        ));
        let users = Arc::new(UserService::new(
            repos.users.clone(),
            profiles.clone(),
            hasher,
            audit.clone(),
            clock.clone(),
        ));
        let auth = Arc::new(AuthService::new(
            repos.users.clone(),
            hasher,
            tokens.clone(),
            mailer,
            audit,
            clock,
            config.verification_ttl,
        ));
        let authenticator = Arc::new(Authenticator::new(tokens, repos.users));

        Self {
            auth,
            users,
            profiles,
            jobs,
            permissions,
            messages,
            billing,
            search,
            authenticator,
        }
    }
}

/// Every `/api/v1` route, with the authenticator installed for `AuthUser`.
pub fn router(services: &AppServices) -> Router {
    Router::new()
        .merge(auth_router(services.auth.clone()))
        .merge(users_router(services.users.clone()))
        .merge(profiles_router(services.profiles.clone()))
        .merge(jobs_router(services.jobs.clone()))
        .merge(permissions_router(services.permissions.clone()))
        .merge(messages_router(services.messages.clone()))
        .merge(billing_router(services.billing.clone()))
        .merge(search_router(services.search.clone()))
        .layer(Extension(services.authenticator.clone()))
}
