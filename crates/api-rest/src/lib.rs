//! # API REST
//!
//! REST API implementation for OpenRoom.
//!
//! Handles:
//! - HTTP endpoints with axum, one per dashboard view
//! - Bearer-token authentication against the backend's sessions
//! - OpenAPI/Swagger documentation
//!
//! Uses `api-shared` for request/response bodies and auth helpers. Each request builds its own
//! view models from scratch, the same way navigating to a page does in the dashboard.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use api_shared::auth::{authenticate, BearerError};
use api_shared::{
    DashboardRes, ErrorRes, HealthRes, HealthService, MenuEntryRes, NavigationRes,
    PatientDetailsRes, PatientsRes, QuickActionRes, SignInReq, SignInRes, StaffMemberRes,
    StaffRes, SummariesRes, SummaryRowRes,
};
use openroom_core::dashboard::Dashboard;
use openroom_core::forms::{add_patient, add_staff, LoginForm, PatientFields, StaffFields};
use openroom_core::navigation::menu_for;
use openroom_core::views::patients::find_patient;
use openroom_core::views::{PatientDetails, PatientList, StaffList, SummaryList};
use openroom_core::{
    AuthContext, AuthError, BackendClient, BackendError, CoreConfig, DashboardStats,
    DischargeSummary, Document, EqualityFilter, Page, Patient, PatientStatus, Role,
    SummaryStatus, User, WardError,
};

/// Application state shared across REST API handlers
///
/// Holds the startup configuration and the backend client every view is built from.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    client: BackendClient,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, client: BackendClient) -> Self {
        Self { cfg, client }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        sign_in,
        sign_out,
        session,
        navigation,
        dashboard,
        list_patients,
        create_patient,
        patient_details,
        list_summaries,
        list_staff,
        create_staff,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        SignInReq,
        SignInRes,
        MenuEntryRes,
        NavigationRes,
        QuickActionRes,
        DashboardRes,
        DashboardStats,
        PatientsRes,
        PatientDetailsRes,
        SummaryRowRes,
        SummariesRes,
        StaffMemberRes,
        StaffRes,
        PatientFields,
        StaffFields,
        Patient,
        DischargeSummary,
        Document,
        User,
        Page,
        Role,
        PatientStatus,
        SummaryStatus,
    ))
)]
struct ApiDoc;

/// Builds the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-out", post(sign_out))
        .route("/auth/session", get(session))
        .route("/navigation", get(navigation))
        .route("/dashboard", get(dashboard))
        .route("/patients", get(list_patients).post(create_patient))
        .route("/patients/:id", get(patient_details))
        .route("/summaries", get(list_summaries))
        .route("/staff", get(list_staff).post(create_staff))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type ApiError = (StatusCode, Json<ErrorRes>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorRes {
            error: message.into(),
        }),
    )
}

fn status_for(e: &WardError) -> StatusCode {
    match e {
        WardError::InvalidInput(_) | WardError::Text(_) => StatusCode::BAD_REQUEST,
        WardError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        WardError::Forbidden(_) => StatusCode::FORBIDDEN,
        WardError::NotFound(_) => StatusCode::NOT_FOUND,
        WardError::Auth(AuthError::EmailTaken) => StatusCode::CONFLICT,
        WardError::Auth(AuthError::WeakPassword(_)) => StatusCode::BAD_REQUEST,
        WardError::Auth(AuthError::InvalidCredentials | AuthError::SessionNotFound) => {
            StatusCode::UNAUTHORIZED
        }
        WardError::Backend(BackendError::Unavailable(_))
        | WardError::Auth(AuthError::Backend(BackendError::Unavailable(_))) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        WardError::Backend(_) | WardError::Auth(AuthError::Backend(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Maps a core error to a response. Server-side failures are logged and their detail hidden.
fn ward_error(e: WardError, context: &str) -> ApiError {
    let status = status_for(&e);
    if status.is_server_error() {
        tracing::error!("{} error: {:?}", context, e);
        api_error(status, "Internal error")
    } else {
        api_error(status, e.to_string())
    }
}

fn bearer_error(e: BearerError) -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, e.to_string())
}

/// Authenticates the request and returns its auth context.
fn signed_in(state: &AppState, headers: &HeaderMap) -> Result<AuthContext, ApiError> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    authenticate(&state.client, header).map_err(bearer_error)
}

fn viewer(auth: &AuthContext) -> Result<&User, ApiError> {
    api_shared::auth::viewer(auth).map_err(bearer_error)
}

fn parse_filter<T>(value: Option<&str>) -> Result<EqualityFilter<T>, ApiError>
where
    T: std::str::FromStr<Err = WardError>,
{
    value
        .unwrap_or_default()
        .parse()
        .map_err(|e: WardError| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    /// Case-insensitive substring search.
    pub search: Option<String>,
    /// A status value, or `all`.
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoleQuery {
    /// Case-insensitive substring search over first name, last name and email.
    pub search: Option<String>,
    /// A role value, or `all`.
    pub role: Option<String>,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// This endpoint is used for monitoring and load balancer health checks.
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/auth/sign-in",
    request_body = SignInReq,
    responses(
        (status = 200, description = "Signed in", body = SignInRes),
        (status = 401, description = "Sign-in failed", body = ErrorRes)
    )
)]
/// Sign in with email and password
///
/// # Returns
/// * `Ok(Json<SignInRes>)` - The access token to send as `Authorization: Bearer <token>`, and
///   the user's profile
/// * `Err(ApiError)` - The message the login form would show
#[axum::debug_handler]
async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInReq>,
) -> Result<Json<SignInRes>, ApiError> {
    let mut auth = AuthContext::new(state.client.clone());
    auth.restore(None);

    let mut form = LoginForm::new(req.email, req.password);
    if !form.submit(&mut auth) {
        let message = form.error().unwrap_or_default().to_string();
        tracing::info!("sign-in rejected: {}", message);
        return Err(api_error(StatusCode::UNAUTHORIZED, message));
    }

    match (auth.access_token(), auth.user()) {
        (Some(token), Some(user)) => Ok(Json(SignInRes {
            access_token: token.to_string(),
            user: user.clone(),
        })),
        _ => Err(api_error(StatusCode::UNAUTHORIZED, "Auth session missing!")),
    }
}

#[utoipa::path(
    post,
    path = "/auth/sign-out",
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Missing or unknown token", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let mut auth = signed_in(&state, &headers)?;
    auth.sign_out()
        .map_err(|e| ward_error(e, "Sign out"))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/auth/session",
    responses(
        (status = 200, description = "The signed-in user", body = User),
        (status = 401, description = "Missing or unknown token", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<User>, ApiError> {
    let auth = signed_in(&state, &headers)?;
    Ok(Json(viewer(&auth)?.clone()))
}

#[utoipa::path(
    get,
    path = "/navigation",
    responses(
        (status = 200, description = "Menu entries for the user's role", body = NavigationRes),
        (status = 401, description = "Missing or unknown token", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn navigation(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<NavigationRes>, ApiError> {
    let auth = signed_in(&state, &headers)?;
    let role = viewer(&auth)?.role;
    Ok(Json(NavigationRes {
        role,
        entries: menu_for(Some(role)).into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardRes),
        (status = 401, description = "Missing or unknown token", body = ErrorRes)
    )
)]
/// Dashboard statistics for the user's institution
///
/// Backend failures are logged and reported as zeroed statistics, like a dashboard that
/// failed to load.
#[axum::debug_handler]
async fn dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DashboardRes>, ApiError> {
    let auth = signed_in(&state, &headers)?;
    let dashboard = Dashboard::open(
        state.client.clone(),
        viewer(&auth)?,
        state.cfg.stay_policy(),
        Utc::now(),
    );
    Ok(Json(DashboardRes::from(&dashboard)))
}

#[utoipa::path(
    get,
    path = "/patients",
    params(StatusQuery),
    responses(
        (status = 200, description = "Visible patients", body = PatientsRes),
        (status = 400, description = "Unknown status", body = ErrorRes),
        (status = 401, description = "Missing or unknown token", body = ErrorRes)
    )
)]
/// List the institution's patients
///
/// # Returns
/// * `Ok(Json<PatientsRes>)` - Patients matching the search and status, newest first
/// * `Err(ApiError)` - `400` for an unknown status, `401` without a valid token
#[axum::debug_handler]
async fn list_patients(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StatusQuery>,
) -> Result<Json<PatientsRes>, ApiError> {
    let auth = signed_in(&state, &headers)?;
    let status = parse_filter::<PatientStatus>(query.status.as_deref())?;

    let mut list = PatientList::open(state.client.clone(), viewer(&auth)?);
    list.set_search(query.search.unwrap_or_default());
    list.set_status(status);
    Ok(Json(PatientsRes::from(&list)))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = PatientFields,
    responses(
        (status = 201, description = "Patient created", body = Patient),
        (status = 400, description = "Missing or malformed field", body = ErrorRes),
        (status = 401, description = "Missing or unknown token", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Add a patient to the user's institution
///
/// The patient starts ACTIVE and is recorded as created by the signed-in user.
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(fields): Json<PatientFields>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let auth = signed_in(&state, &headers)?;
    let patient = add_patient(&state.client, viewer(&auth)?, &fields)
        .map_err(|e| ward_error(e, "Add patient"))?;
    Ok((StatusCode::CREATED, Json(patient)))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (
            status = 200,
            description = "Patient with summaries and documents",
            body = PatientDetailsRes
        ),
        (status = 401, description = "Missing or unknown token", body = ErrorRes),
        (status = 404, description = "No such patient in this institution", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn patient_details(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<PatientDetailsRes>, ApiError> {
    let auth = signed_in(&state, &headers)?;
    let institution_id = viewer(&auth)?.institution_id;

    let patient = find_patient(&state.client, institution_id, id)
        .map_err(|e| ward_error(e, "Find patient"))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("patient {id} not found")))?;
    Ok(Json(PatientDetails::open(&state.client, patient).into()))
}

#[utoipa::path(
    get,
    path = "/summaries",
    params(StatusQuery),
    responses(
        (status = 200, description = "Visible discharge summaries", body = SummariesRes),
        (status = 400, description = "Unknown status", body = ErrorRes),
        (status = 401, description = "Missing or unknown token", body = ErrorRes)
    )
)]
/// List discharge summaries of the institution's patients
///
/// Each row carries the actions the user is offered for it.
#[axum::debug_handler]
async fn list_summaries(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StatusQuery>,
) -> Result<Json<SummariesRes>, ApiError> {
    let auth = signed_in(&state, &headers)?;
    let status = parse_filter::<SummaryStatus>(query.status.as_deref())?;

    let mut list = SummaryList::open(state.client.clone(), viewer(&auth)?);
    list.set_search(query.search.unwrap_or_default());
    list.set_status(status);
    Ok(Json(SummariesRes::from(&list)))
}

#[utoipa::path(
    get,
    path = "/staff",
    params(RoleQuery),
    responses(
        (status = 200, description = "Visible staff members", body = StaffRes),
        (status = 400, description = "Unknown role", body = ErrorRes),
        (status = 401, description = "Missing or unknown token", body = ErrorRes),
        (status = 403, description = "Only doctors manage staff", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn list_staff(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RoleQuery>,
) -> Result<Json<StaffRes>, ApiError> {
    let auth = signed_in(&state, &headers)?;
    let role = parse_filter::<Role>(query.role.as_deref())?;

    let mut list = StaffList::open(state.client.clone(), viewer(&auth)?)
        .map_err(|e| ward_error(e, "Staff list"))?;
    list.set_search(query.search.unwrap_or_default());
    list.set_role(role);
    Ok(Json(StaffRes::from(&list)))
}

#[utoipa::path(
    post,
    path = "/staff",
    request_body = StaffFields,
    responses(
        (status = 201, description = "Staff member created", body = User),
        (status = 400, description = "Missing or malformed field", body = ErrorRes),
        (status = 401, description = "Missing or unknown token", body = ErrorRes),
        (status = 403, description = "Only doctors manage staff", body = ErrorRes),
        (status = 409, description = "Email already registered", body = ErrorRes)
    )
)]
/// Add a NURSE or JUNIOR_DOCTOR to the user's institution
///
/// Creates sign-in credentials with the temporary password, then the profile row.
#[axum::debug_handler]
async fn create_staff(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(fields): Json<StaffFields>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let auth = signed_in(&state, &headers)?;
    let member = add_staff(&state.client, viewer(&auth)?, &fields)
        .map_err(|e| ward_error(e, "Add staff"))?;
    Ok((StatusCode::CREATED, Json(member)))
}
