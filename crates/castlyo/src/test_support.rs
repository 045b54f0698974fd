//! Fixtures shared by the service test modules.

use std::sync::Arc;

use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::body::Body;
use axum::Router;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::app::{router, AppDependencies, AppServices, Repositories};
use crate::audit::{AuditEntry, AuditRepository, ConsentRecord};
use crate::auth::{AuthUser, MemoryMailer, RegisterRequest, VerifyEmailRequest};
use crate::billing::{PlanCatalog, SubscribeRequest};
use crate::clock::FixedClock;
use crate::config::AuthConfig;
use crate::error::RepositoryError;
use crate::ids::{JobId, PermissionId, UserId};
use crate::jobs::{JobCategory, JobPost, JobRepository, NewJobPost};
use crate::permissions::{ContactPermission, PermissionRepository, PermissionStatus};
use crate::profiles::{AgencyProfileInput, ContactDetails, TalentProfileInput, Visibility};
use crate::search::MemorySearchIndex;
use crate::store::MemoryStore;
use crate::users::Role;

pub(crate) const PASSWORD: &str = "Castings2025";

pub(crate) struct Harness {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) mailer: MemoryMailer,
    pub(crate) clock: Arc<FixedClock>,
    pub(crate) index: Arc<MemorySearchIndex>,
    pub(crate) services: AppServices,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_repositories(|_, _| {})
    }

    /// Same graph with some storage seams swapped, e.g. for failure stubs.
    pub(crate) fn with_repositories(
        customize: impl FnOnce(&Arc<MemoryStore>, &mut Repositories),
    ) -> Self {
        let store = Arc::new(MemoryStore::new());
        let mailer = MemoryMailer::default();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
                .single()
                .expect("valid instant"),
        ));
        let index = Arc::new(MemorySearchIndex::default());

        let mut repositories = Repositories::from_store(store.clone());
        customize(&store, &mut repositories);

        let services = AppServices::build(
            &AuthConfig::for_tests(),
            AppDependencies {
                repositories,
                search_index: index.clone(),
                mailer: Arc::new(mailer.clone()),
                clock: clock.clone(),
                catalog: Arc::new(PlanCatalog::standard()),
            },
        );

        Self {
            store,
            mailer,
            clock,
            index,
            services,
        }
    }

    pub(crate) fn router(&self) -> Router {
        router(&self.services)
    }

    pub(crate) fn today(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date")
    }

    /// Register and verify an account; returns the caller identity.
    pub(crate) fn verified(&self, email: &str, role: Role) -> AuthUser {
        let registration = self
            .services
            .auth
            .register(register_request(email, role))
            .expect("registration succeeds");
        let token = self
            .mailer
            .last_variable(email, "token")
            .expect("verification mail sent");
        self.services
            .auth
            .verify_email(VerifyEmailRequest { token })
            .expect("verification succeeds");

        AuthUser {
            id: registration.user.id,
            role,
        }
    }

    /// Verified talent with a public profile.
    pub(crate) fn talent(&self, email: &str) -> AuthUser {
        let talent = self.verified(email, Role::Talent);
        self.services
            .profiles
            .upsert_talent(&talent, talent_input("Ana", "Silva"))
            .expect("talent profile saved");
        talent
    }

    /// Verified agency with a profile and an active plan.
    pub(crate) fn agency(&self, email: &str, plan_code: &str) -> AuthUser {
        let agency = self.verified(email, Role::Agency);
        self.services
            .profiles
            .upsert_agency(&agency, agency_input("Northlight Casting"))
            .expect("agency profile saved");
        self.services
            .billing
            .subscribe(
                &agency,
                SubscribeRequest {
                    plan_code: plan_code.to_string(),
                },
            )
            .expect("subscription activated");
        agency
    }

    pub(crate) fn post_job(&self, agency: &AuthUser, title: &str) -> JobPost {
        self.services
            .jobs
            .create(agency, job_request(title))
            .expect("job created")
    }

    pub(crate) fn bearer(&self, email: &str) -> String {
        let response = self
            .services
            .auth
            .login(crate::auth::LoginRequest {
                email: email.to_string(),
                password: PASSWORD.to_string(),
            })
            .expect("login succeeds");
        format!("Bearer {}", response.access_token)
    }
}

pub(crate) fn register_request(email: &str, role: Role) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        role,
        display_name: email.split('@').next().unwrap_or(email).to_string(),
        accept_terms: true,
        accept_privacy: true,
        marketing_opt_in: false,
    }
}

pub(crate) fn talent_input(first: &str, last: &str) -> TalentProfileInput {
    TalentProfileInput {
        stage_name: None,
        first_name: first.to_string(),
        last_name: last.to_string(),
        birth_date: NaiveDate::from_ymd_opt(1996, 7, 14),
        gender: None,
        height_cm: Some(172),
        city: "Lisbon".to_string(),
        country: "Portugal".to_string(),
        skills: vec!["Dance".to_string(), "Singing".to_string()],
        languages: vec!["Portuguese".to_string(), "English".to_string()],
        bio: Some("Stage actor with musical theatre experience".to_string()),
        contact: ContactDetails {
            phone: Some("+351 900 000 000".to_string()),
            email: Some(format!("{}@contact.test", first.to_lowercase())),
        },
        visibility: Visibility::Public,
    }
}

pub(crate) fn agency_input(company: &str) -> AgencyProfileInput {
    AgencyProfileInput {
        company_name: company.to_string(),
        website: Some("https://northlight.test".to_string()),
        city: "Porto".to_string(),
        country: "Portugal".to_string(),
        description: None,
        contact: ContactDetails::default(),
    }
}

pub(crate) fn job_request(title: &str) -> NewJobPost {
    NewJobPost {
        title: title.to_string(),
        description: "Two day shoot for a national campaign".to_string(),
        category: JobCategory::Commercial,
        location: "Lisbon, Portugal".to_string(),
        compensation: Some("EUR 600/day".to_string()),
        age_min: Some(20),
        age_max: Some(35),
        gender: None,
        deadline: NaiveDate::from_ymd_opt(2025, 3, 31),
    }
}

pub(crate) fn json_request(method: Method, uri: &str, bearer: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(bearer) = bearer {
        builder = builder.header(header::AUTHORIZATION, bearer);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub(crate) fn get_request(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(bearer) = bearer {
        builder = builder.header(header::AUTHORIZATION, bearer);
    }
    builder.body(Body::empty()).expect("request builds")
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Job storage whose inserts always fail; reads go to the shared store.
pub(crate) struct RejectingJobs(pub(crate) Arc<MemoryStore>);

impl JobRepository for RejectingJobs {
    fn insert(&self, _job: JobPost) -> Result<JobPost, RepositoryError> {
        Err(RepositoryError::Unavailable("job table offline".to_string()))
    }

    fn update(&self, job: JobPost) -> Result<(), RepositoryError> {
        JobRepository::update(self.0.as_ref(), job)
    }

    fn fetch(&self, id: JobId) -> Result<Option<JobPost>, RepositoryError> {
        JobRepository::fetch(self.0.as_ref(), id)
    }

    fn all(&self) -> Result<Vec<JobPost>, RepositoryError> {
        JobRepository::all(self.0.as_ref())
    }

    fn by_agency(&self, agency_id: UserId) -> Result<Vec<JobPost>, RepositoryError> {
        JobRepository::by_agency(self.0.as_ref(), agency_id)
    }
}

/// Permission storage whose writes always fail.
pub(crate) struct RejectingPermissions(pub(crate) Arc<MemoryStore>);

impl PermissionRepository for RejectingPermissions {
    fn save(&self, _permission: ContactPermission) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("permission table offline".to_string()))
    }

    fn fetch(&self, id: PermissionId) -> Result<Option<ContactPermission>, RepositoryError> {
        PermissionRepository::fetch(self.0.as_ref(), id)
    }

    fn find(
        &self,
        agency_id: UserId,
        talent_id: UserId,
    ) -> Result<Option<ContactPermission>, RepositoryError> {
        PermissionRepository::find(self.0.as_ref(), agency_id, talent_id)
    }

    fn for_talent(
        &self,
        talent_id: UserId,
        status: Option<PermissionStatus>,
    ) -> Result<Vec<ContactPermission>, RepositoryError> {
        PermissionRepository::for_talent(self.0.as_ref(), talent_id, status)
    }

    fn for_agency(
        &self,
        agency_id: UserId,
        status: Option<PermissionStatus>,
    ) -> Result<Vec<ContactPermission>, RepositoryError> {
        PermissionRepository::for_agency(self.0.as_ref(), agency_id, status)
    }
}

/// Audit storage that accepts audit rows but refuses consent rows.
/// Registration consents go through the user store and are unaffected.
pub(crate) struct RejectingConsents(pub(crate) Arc<MemoryStore>);

impl AuditRepository for RejectingConsents {
    fn append_audit(&self, entry: AuditEntry) -> Result<(), RepositoryError> {
        AuditRepository::append_audit(self.0.as_ref(), entry)
    }

    fn append_consent(&self, _record: ConsentRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("consent log offline".to_string()))
    }

    fn audits_for_subject(
        &self,
        subject_type: &str,
        subject_id: &str,
    ) -> Result<Vec<AuditEntry>, RepositoryError> {
        AuditRepository::audits_for_subject(self.0.as_ref(), subject_type, subject_id)
    }

    fn consents_for_user(&self, user_id: UserId) -> Result<Vec<ConsentRecord>, RepositoryError> {
        AuditRepository::consents_for_user(self.0.as_ref(), user_id)
    }
}
