use castlyo::auth::{AuthUser, LoginRequest, MemoryMailer, RegisterRequest, VerifyEmailRequest};
use castlyo::billing::{PlanCatalog, SubscribeRequest, SubscriptionPlan};
use castlyo::clock::{Clock, SystemClock};
use castlyo::config::AuthConfig;
use castlyo::error::{AppError, ServiceError};
use castlyo::jobs::{ApplicationStatus, ApplyRequest, JobCategory, NewJobPost, StatusUpdate};
use castlyo::messages::{NewMessage, ReplyRequest};
use castlyo::permissions::{ContactRequest, Decision, RespondRequest};
use castlyo::profiles::{AgencyProfileInput, ContactDetails, TalentProfileInput, Visibility};
use castlyo::search::{SearchKind, SearchParams};
use castlyo::users::Role;
use castlyo::{AppDependencies, AppServices};
use chrono::{Duration, NaiveDate};
use clap::{Args, ValueEnum};
use std::sync::Arc;

const DEMO_PASSWORD: &str = "Castings2025";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum AudienceArg {
    Talent,
    Agency,
}

impl From<AudienceArg> for Role {
    fn from(value: AudienceArg) -> Self {
        match value {
            AudienceArg::Talent => Role::Talent,
            AudienceArg::Agency => Role::Agency,
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct PlansArgs {
    /// Only list plans sold to this side of the marketplace
    #[arg(long, value_enum)]
    pub(crate) role: Option<AudienceArg>,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Plan the demo agency subscribes to
    #[arg(long, default_value = "AGENCY_PRO")]
    pub(crate) plan: String,
    /// Stop after the application round and skip the contact and messaging steps
    #[arg(long, default_value_t = false)]
    pub(crate) skip_contact: bool,
}

pub(crate) fn print_plans(args: PlansArgs) -> Result<(), AppError> {
    let catalog = PlanCatalog::standard();
    let plans: Vec<&SubscriptionPlan> = match args.role {
        Some(role) => catalog.for_role(role.into()),
        None => catalog.plans().iter().collect(),
    };

    println!("Castlyo subscription plans");
    for plan in plans {
        println!("{}", plan_line(plan));
    }
    Ok(())
}

fn plan_line(plan: &SubscriptionPlan) -> String {
    let quotas: Vec<String> = plan
        .quotas
        .iter()
        .map(|quota| format!("{}={}", quota.kind, quota.quota))
        .collect();
    let quotas = if quotas.is_empty() {
        "no quotas".to_string()
    } else {
        quotas.join(", ")
    };
    format!(
        "- {} ({}, {}): {}.{:02} {} -> {}",
        plan.code,
        plan.name,
        plan.audience,
        plan.price_cents / 100,
        plan.price_cents % 100,
        plan.currency,
        quotas
    )
}

/// Everything runs against in-memory storage; mail lands in a local outbox.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let mailer = MemoryMailer::default();
    let clock = Arc::new(SystemClock);
    let today = clock.today();
    let services = AppServices::build(
        &AuthConfig::for_tests(),
        AppDependencies::in_memory(Arc::new(mailer.clone()), clock),
    );

    println!("Castlyo marketplace demo (in-memory, {today})");

    println!("\nAccounts");
    let talent = onboard(&services, &mailer, "ana.silva@demo.castlyo", Role::Talent)?;
    let agency = onboard(&services, &mailer, "casting@northlight.demo", Role::Agency)?;

    println!("\nProfiles");
    let profile = services.profiles.upsert_talent(&talent, demo_talent_profile())?;
    println!(
        "- Talent {} in {}, {} (skills: {})",
        profile.display_name,
        profile.city,
        profile.country,
        profile.skills.join(", ")
    );
    let agency_profile = services.profiles.upsert_agency(&agency, demo_agency_profile())?;
    println!("- Agency {} in {}", agency_profile.company_name, agency_profile.city);

    println!("\nSubscription");
    let subscription = services.billing.subscribe(
        &agency,
        SubscribeRequest {
            plan_code: args.plan.clone(),
        },
    )?;
    println!("- {}", plan_line(&subscription.plan));
    for entitlement in &subscription.entitlements {
        println!("  {} balance {}", entitlement.kind, entitlement.balance);
    }

    println!("\nJobs");
    let job = services.jobs.create(&agency, demo_job(today))?;
    println!("- Posted \"{}\" ({}) closing {:?}", job.title, job.id, job.deadline);
    let results = services.search.search(
        SearchKind::Job,
        SearchParams {
            q: Some("commercial shoot".to_string()),
            ..SearchParams::default()
        },
    )?;
    println!("  Job search for \"commercial shoot\": {} hit(s)", results.total);

    let application = services.jobs.apply(
        &talent,
        job.id,
        ApplyRequest {
            cover_letter: Some("Available both shoot days, fluent in English.".to_string()),
        },
    )?;
    println!("- Application {} -> {}", application.id, application.status.as_str());
    let application = services.jobs.set_application_status(
        &agency,
        application.id,
        StatusUpdate {
            status: ApplicationStatus::Shortlisted,
        },
    )?;
    println!("  Agency moved it to {}", application.status.as_str());

    let csv = services.jobs.export_applications_csv(&agency, job.id)?;
    println!("  Applicant export:");
    for line in csv.lines() {
        println!("    {line}");
    }

    if args.skip_contact {
        return Ok(());
    }

    println!("\nContact permission");
    let before = services.profiles.talent(Some(&agency), talent.id)?;
    println!("- Contact visible before consent: {}", before.contact_visible);
    let permission = services.permissions.request(
        &agency,
        ContactRequest {
            talent_id: talent.id,
            message: Some("We would like to discuss a callback.".to_string()),
        },
    )?;
    println!("- Request {} -> {}", permission.id, permission.status);
    let permission = services.permissions.respond(
        &talent,
        permission.id,
        RespondRequest {
            decision: Decision::Grant,
        },
    )?;
    println!("  Talent answered -> {}", permission.status);
    let after = services.profiles.talent(Some(&agency), talent.id)?;
    if let Some(contact) = &after.contact {
        println!(
            "  Contact now visible: phone {} / email {}",
            contact.phone.as_deref().unwrap_or("-"),
            contact.email.as_deref().unwrap_or("-")
        );
    }

    println!("\nMessages");
    let opening = services.messages.send(
        &agency,
        NewMessage {
            recipient_id: talent.id,
            subject: Some(format!("Callback for {}", job.title)),
            body: "Could you come in on Thursday at 10:00?".to_string(),
        },
    )?;
    services.messages.reply(
        &talent,
        opening.thread_id,
        ReplyRequest {
            body: "Thursday works, see you then.".to_string(),
        },
    )?;
    for summary in services.messages.threads(&agency)? {
        println!(
            "- Thread {} \"{}\" ({} unread for the agency)",
            summary.thread.id,
            summary.thread.subject.as_deref().unwrap_or("(no subject)"),
            summary.unread
        );
    }
    let view = services.messages.messages(&agency, opening.thread_id)?;
    for message in view.messages {
        let author = if message.sender_id == agency.id {
            "agency"
        } else {
            "talent"
        };
        println!("  [{author}] {}", message.body);
    }

    println!("\nEntitlements left");
    for entitlement in services.billing.entitlements(&agency)? {
        println!(
            "- {}: {} of {}",
            entitlement.kind, entitlement.balance, entitlement.granted
        );
    }

    Ok(())
}

/// Register, confirm the emailed token, log in and resolve the bearer token
/// back into a caller identity the services accept.
fn onboard(
    services: &AppServices,
    mailer: &MemoryMailer,
    email: &str,
    role: Role,
) -> Result<AuthUser, AppError> {
    let display_name = email.split('@').next().unwrap_or(email).to_string();
    let registration = services.auth.register(RegisterRequest {
        email: email.to_string(),
        password: DEMO_PASSWORD.to_string(),
        role,
        display_name,
        accept_terms: true,
        accept_privacy: true,
        marketing_opt_in: false,
    })?;

    let token = mailer
        .last_variable(email, "token")
        .ok_or(ServiceError::NotFound("verification email"))?;
    services.auth.verify_email(VerifyEmailRequest { token })?;

    let session = services.auth.login(LoginRequest {
        email: email.to_string(),
        password: DEMO_PASSWORD.to_string(),
    })?;
    let caller = services.authenticator.authenticate(&session.access_token)?;

    println!(
        "- {} registered as {} ({}), verified, token valid for {}s",
        registration.user.email, role, caller.id, session.expires_in
    );
    Ok(caller)
}

fn demo_talent_profile() -> TalentProfileInput {
    TalentProfileInput {
        stage_name: Some("Ana S.".to_string()),
        first_name: "Ana".to_string(),
        last_name: "Silva".to_string(),
        birth_date: NaiveDate::from_ymd_opt(1996, 7, 14),
        gender: None,
        height_cm: Some(172),
        city: "Lisbon".to_string(),
        country: "Portugal".to_string(),
        skills: vec!["Acting".to_string(), "Dance".to_string()],
        languages: vec!["Portuguese".to_string(), "English".to_string()],
        bio: Some("Screen and stage actor, comfortable with commercial work.".to_string()),
        contact: ContactDetails {
            phone: Some("+351 910 000 000".to_string()),
            email: Some("ana.bookings@demo.castlyo".to_string()),
        },
        visibility: Visibility::Public,
    }
}

fn demo_agency_profile() -> AgencyProfileInput {
    AgencyProfileInput {
        company_name: "Northlight Casting".to_string(),
        website: Some("https://northlight.demo".to_string()),
        city: "Porto".to_string(),
        country: "Portugal".to_string(),
        description: Some("Commercial and feature casting across Iberia.".to_string()),
        contact: ContactDetails::default(),
    }
}

fn demo_job(today: NaiveDate) -> NewJobPost {
    NewJobPost {
        title: "Lead for national commercial shoot".to_string(),
        description: "Two day commercial shoot in Lisbon for a beverage campaign.".to_string(),
        category: JobCategory::Commercial,
        location: "Lisbon, Portugal".to_string(),
        compensation: Some("EUR 600/day".to_string()),
        age_min: Some(20),
        age_max: Some(40),
        gender: None,
        deadline: today.checked_add_signed(Duration::days(21)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_runs_end_to_end() {
        run_demo(DemoArgs {
            plan: "AGENCY_PRO".to_string(),
            skip_contact: false,
        })
        .expect("demo completes");
    }

    #[test]
    fn demo_rejects_unknown_plans() {
        let outcome = run_demo(DemoArgs {
            plan: "AGENCY_GOLD".to_string(),
            skip_contact: true,
        });
        assert!(matches!(outcome, Err(AppError::Service(_))));
    }

    #[test]
    fn plan_lines_show_price_and_quotas() {
        let catalog = PlanCatalog::standard();
        let plan = catalog.find("AGENCY_PRO").expect("plan exists");
        let line = plan_line(plan);
        assert!(line.starts_with("- AGENCY_PRO (Agency Pro, AGENCY): 99.00"));
        assert!(line.contains("JOB_POST=20"));

        let free = catalog.find("TALENT_FREE").expect("plan exists");
        assert!(plan_line(free).ends_with("no quotas"));
    }
}
