use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use chrono::Duration as ChronoDuration;
use domain::repositories::{
    ApplicantRepository, GuarantorRepository, OtpRepository, WorkExperienceRepository,
};
use domain::services::{
    FileStorage, InvitationWorkflow, Mailer, ProfileService, ProfileSettings,
    WorkExperienceService,
};
use persistence::repositories::{
    PgApplicantRepository, PgGuarantorRepository, PgOtpRepository, PgWorkExperienceRepository,
};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, security_headers_middleware,
    trace_id, RateLimiterState,
};
use crate::routes::{applicant_profile, guarantors, health, work_experience};
use crate::services::cookies::CookieHelper;
use crate::services::email::EmailService;
use crate::services::storage::{S3Storage, UnconfiguredStorage};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub profiles: Arc<ProfileService>,
    pub guarantors: Arc<InvitationWorkflow>,
    pub work_experience: Arc<WorkExperienceService>,
    pub cookies: CookieHelper,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

/// Ports the services are built from.
#[derive(Clone)]
pub struct Collaborators {
    pub applicants: Arc<dyn ApplicantRepository>,
    pub otps: Arc<dyn OtpRepository>,
    pub work_experience: Arc<dyn WorkExperienceRepository>,
    pub guarantors: Arc<dyn GuarantorRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub storage: Arc<dyn FileStorage>,
}

impl Collaborators {
    /// PostgreSQL repositories, the configured mail provider and S3 storage
    /// (or a refusing stub when storage is disabled).
    pub async fn from_config(config: &Config, pool: &PgPool) -> Self {
        let storage: Arc<dyn FileStorage> = if config.storage.enabled {
            Arc::new(S3Storage::from_config(&config.storage).await)
        } else {
            Arc::new(UnconfiguredStorage)
        };

        Self {
            applicants: Arc::new(PgApplicantRepository::new(pool.clone())),
            otps: Arc::new(PgOtpRepository::new(pool.clone())),
            work_experience: Arc::new(PgWorkExperienceRepository::new(pool.clone())),
            guarantors: Arc::new(PgGuarantorRepository::new(pool.clone())),
            mailer: Arc::new(
                EmailService::new(config.email.clone())
                    .with_otp_ttl_minutes(config.otp.ttl_minutes),
            ),
            storage,
        }
    }
}

impl AppState {
    pub fn new(config: Config, pool: PgPool, deps: Collaborators) -> Result<Self, JwtError> {
        let tokens = Arc::new(JwtConfig::with_leeway(
            &config.jwt.secret,
            config.jwt.session_expiry_secs,
            config.jwt.leeway_secs,
        )?);

        let settings = ProfileSettings {
            otp_length: config.otp.length,
            otp_ttl: ChronoDuration::minutes(config.otp.ttl_minutes),
            otp_max_attempts: config.otp.max_attempts,
            default_avatar_url: Some(config.storage.default_avatar_url.clone())
                .filter(|url| !url.is_empty()),
        };

        let profiles = ProfileService::new(
            deps.applicants.clone(),
            deps.otps,
            deps.work_experience.clone(),
            deps.mailer.clone(),
            deps.storage,
            tokens.clone(),
            settings,
        );
        let guarantors = InvitationWorkflow::new(
            deps.applicants,
            deps.guarantors,
            deps.mailer,
            tokens,
            config.guarantors.form_base_url.clone(),
        )
        .with_invitation_ttl(ChronoDuration::days(config.jwt.invitation_ttl_days));
        let work_experience = WorkExperienceService::new(deps.work_experience);
        let cookies = CookieHelper::new(config.cookies.clone(), config.jwt.session_expiry_secs);
        let rate_limiter = RateLimiterState::new(
            config.security.auth_rate_limit_per_minute,
            config.security.trust_proxy_headers,
        )
        .map(Arc::new);

        Ok(Self {
            pool,
            config: Arc::new(config),
            profiles: Arc::new(profiles),
            guarantors: Arc::new(guarantors),
            work_experience: Arc::new(work_experience),
            cookies,
            rate_limiter,
        })
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    // Listed origins may send the session cookie.
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let rate_limit = middleware::from_fn_with_state(state.clone(), rate_limit_middleware);

    // Unauthenticated endpoints that accept credentials or one-time codes
    let limited_auth_routes = Router::new()
        .route("/signup", post(applicant_profile::signup))
        .route("/login", post(applicant_profile::login))
        .route("/request-otp", post(applicant_profile::request_otp))
        .route("/verify-otp", post(applicant_profile::verify_otp))
        .route("/forgot-password", post(applicant_profile::forgot_password))
        .route("/reset-password", post(applicant_profile::reset_password))
        .route_layer(rate_limit.clone());

    let auth_routes = Router::new()
        .route("/validate-user", get(applicant_profile::validate_user))
        .route("/logout", post(applicant_profile::logout))
        .merge(limited_auth_routes);

    let applicant_routes = Router::new()
        .nest("/profile/auth", auth_routes)
        .route(
            "/profile",
            get(applicant_profile::get_profile).put(applicant_profile::update_profile),
        )
        .route(
            "/work-experience",
            get(work_experience::list_work_experience).post(work_experience::add_work_experience),
        )
        .route(
            "/work-experience/:id",
            get(work_experience::get_work_experience)
                .put(work_experience::update_work_experience)
                .delete(work_experience::delete_work_experience),
        );

    let guarantor_routes = Router::new()
        .route("/", get(guarantors::list_guarantors))
        .route("/send-invite", post(guarantors::send_invite))
        .route("/invites", get(guarantors::get_invites))
        .route("/:guarantor_id", get(guarantors::get_guarantor))
        .merge(
            Router::new()
                .route("/submit-form", post(guarantors::submit_form))
                .route_layer(rate_limit),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1/applicants", applicant_routes)
        .nest("/api/v1/guarantors", guarantor_routes)
        // Global middleware (bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(middleware::from_fn_with_state(
            config.security.hsts_enabled,
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config.security.cors_origins))
        .with_state(state)
}
