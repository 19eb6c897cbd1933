//! HTTP request handlers for the sessiongate server

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::header::AUTHORIZATION;
use hyper::{Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use sessiongate_core::*;
use std::convert::Infallible;
use tracing::{debug, error, info, warn};

use crate::server::{json_response, ResponseBody};
use crate::state::AppState;

type HandlerResult = Result<Response<ResponseBody>>;

const ALREADY_REVOKED: &str = "Access denied. Token has already been revoked.";
const PROJECT_NOT_FOUND: &str = "Project not found.";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    Health,
    Login,
    Logout,
    NewUser,
    ListProjects,
    CreateProject,
    UpdateProject(String),
    DeleteProject(String),
    ListUsers,
}

impl Route {
    fn resolve(method: &Method, path: &str) -> Option<Route> {
        let route = match (method, path) {
            (&Method::GET, "/health") => Route::Health,
            (&Method::POST, "/api/login") => Route::Login,
            (&Method::POST, "/api/logout") => Route::Logout,
            (&Method::POST, "/api/new-user") => Route::NewUser,
            (&Method::GET, "/api/projects") => Route::ListProjects,
            (&Method::POST, "/api/create-new-project") => Route::CreateProject,
            (&Method::GET, "/api/get-users") => Route::ListUsers,
            (method, path) => {
                let id = path.strip_prefix("/api/projects/")?;
                if id.is_empty() || id.contains('/') {
                    return None;
                }
                match *method {
                    Method::PATCH => Route::UpdateProject(id.to_string()),
                    Method::DELETE => Route::DeleteProject(id.to_string()),
                    _ => return None,
                }
            }
        };
        Some(route)
    }

    fn requires_auth(&self) -> bool {
        !matches!(self, Route::Health | Route::Login | Route::Logout | Route::NewUser)
    }
}

/// Main request handler
pub async fn handle_request<B>(
    mut req: Request<B>,
    state: AppState,
) -> std::result::Result<Response<ResponseBody>, Infallible>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("Handling {} {}", method, path);

    let route = match Route::resolve(&method, &path) {
        Some(route) => route,
        None => {
            debug!("{} {} -> no route", method, path);
            return Ok(json_response(
                StatusCode::NOT_FOUND,
                &json!({"error": "Not found", "kind": "NotFoundError"}),
            ));
        }
    };

    if route.requires_auth() {
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        match state.gate.admit(header) {
            Ok(identity) => {
                req.extensions_mut().insert(identity);
            }
            Err(kind) => {
                info!("{} {} -> 401 {}", method, path, kind.as_str());
                return Ok(error_response(&SessionGateError::from(kind)));
            }
        }
    }

    let result = match route {
        Route::Health => handle_health(),
        Route::Login => handle_login(req, &state).await,
        Route::Logout => handle_logout(&req, &state),
        Route::NewUser => handle_new_user(req, &state).await,
        Route::ListProjects => handle_list_projects(&state).await,
        Route::CreateProject => handle_create_project(req, &state).await,
        Route::UpdateProject(id) => handle_update_project(req, &state, &id).await,
        Route::DeleteProject(id) => handle_delete_project(&req, &state, &id).await,
        Route::ListUsers => handle_list_users(&state).await,
    };

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            if e.status_code() >= 500 {
                error!("Handler error for {} {}: {}", method, path, e);
            }
            error_response(&e)
        }
    };

    info!("{} {} -> {}", method, path, response.status());
    Ok(response)
}

/// `{"error", "kind"}` body for a failed request
pub fn error_response(err: &SessionGateError) -> Response<ResponseBody> {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_response(
        status,
        &json!({"error": err.public_message(), "kind": err.kind()}),
    )
}

fn handle_health() -> HandlerResult {
    Ok(json_response(
        StatusCode::OK,
        &json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "service": "sessiongate"
        }),
    ))
}

#[derive(Debug, Default, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

async fn handle_login<B>(req: Request<B>, state: &AppState) -> HandlerResult
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let login: LoginRequest = read_json(req).await?;
    let email = login.email.unwrap_or_default();
    let password = login.password.unwrap_or_default();

    match state.sessions.login(&email, &password).await {
        Ok(issued) => Ok(json_response(StatusCode::OK, &json!({"token": issued.token}))),
        Err(e) => {
            if e.auth_kind() == Some(AuthErrorKind::InvalidCredentials) {
                warn!("login rejected");
            }
            Err(e)
        }
    }
}

fn handle_logout<B>(req: &Request<B>, state: &AppState) -> HandlerResult {
    let token = req.uri().query().and_then(|query| query_param(query, "token"));
    let outcome = state.sessions.logout(token.as_deref())?;

    if outcome.already_revoked {
        return Ok(json_response(
            StatusCode::UNAUTHORIZED,
            &json!({
                "error": ALREADY_REVOKED,
                "kind": AuthErrorKind::RevokedToken.as_str(),
                "alreadyRevoked": true
            }),
        ));
    }

    Ok(json_response(
        StatusCode::OK,
        &json!({"message": "Logout successful.", "alreadyRevoked": false}),
    ))
}

async fn handle_new_user<B>(req: Request<B>, state: &AppState) -> HandlerResult
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let new_user: NewUser = read_json(req).await?;
    let user_id = state.sessions.register(new_user).await?;
    Ok(json_response(StatusCode::CREATED, &json!({"userId": user_id})))
}

async fn handle_list_projects(state: &AppState) -> HandlerResult {
    let projects = state.projects.clone();
    let entries = tokio::task::spawn_blocking(move || projects.list()).await??;
    if entries.is_empty() {
        return Err(SessionGateError::NotFound("No projects found.".to_string()));
    }
    Ok(json_response(StatusCode::OK, &serde_json::to_value(&entries)?))
}

async fn handle_create_project<B>(req: Request<B>, state: &AppState) -> HandlerResult
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let subject = caller(&req);
    let project: Project = read_json(req).await?;

    let projects = state.projects.clone();
    let project_id = tokio::task::spawn_blocking(move || projects.create(&project)).await??;

    info!(project_id = %project_id, created_by = %subject, "project created");
    Ok(json_response(StatusCode::CREATED, &json!({"projectID": project_id})))
}

async fn handle_update_project<B>(req: Request<B>, state: &AppState, id: &str) -> HandlerResult
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let subject = caller(&req);
    let id = project_id(id)?;
    let patch: ProjectPatch = read_json(req).await?;

    let projects = state.projects.clone();
    let lookup_id = id.clone();
    let updated = tokio::task::spawn_blocking(move || projects.update(&lookup_id, patch)).await??;
    if !updated {
        return Err(SessionGateError::NotFound(PROJECT_NOT_FOUND.to_string()));
    }

    info!(project_id = %id, updated_by = %subject, "project updated");
    Ok(json_response(
        StatusCode::OK,
        &json!({"message": "Project updated successfully."}),
    ))
}

async fn handle_delete_project<B>(req: &Request<B>, state: &AppState, id: &str) -> HandlerResult {
    let subject = caller(req);
    let id = project_id(id)?;

    let projects = state.projects.clone();
    let lookup_id = id.clone();
    let deleted = tokio::task::spawn_blocking(move || projects.delete(&lookup_id)).await??;
    if !deleted {
        return Err(SessionGateError::NotFound(PROJECT_NOT_FOUND.to_string()));
    }

    info!(project_id = %id, deleted_by = %subject, "project deleted");
    Ok(json_response(
        StatusCode::OK,
        &json!({"message": "Project deleted successfully."}),
    ))
}

async fn handle_list_users(state: &AppState) -> HandlerResult {
    let users = state.users.clone();
    let profiles = tokio::task::spawn_blocking(move || users.list_profiles()).await??;
    if profiles.is_empty() {
        return Err(SessionGateError::NotFound("No users found.".to_string()));
    }
    Ok(json_response(StatusCode::OK, &serde_json::to_value(&profiles)?))
}

fn project_id(id: &str) -> Result<ProjectId> {
    ProjectId::new(id).map_err(|_| SessionGateError::NotFound(PROJECT_NOT_FOUND.to_string()))
}

/// Subject admitted by the gate, for logging
fn caller<B>(req: &Request<B>) -> String {
    req.extensions()
        .get::<AuthenticatedIdentity>()
        .map(|identity| identity.subject.to_string())
        .unwrap_or_default()
}

async fn read_json<T, B>(req: Request<B>) -> Result<T>
where
    T: DeserializeOwned + Default,
    B: Body,
    B::Error: std::fmt::Display,
{
    let body: Bytes = req
        .into_body()
        .collect()
        .await
        .map_err(|e| SessionGateError::Validation(format!("Failed to read request body: {}", e)))?
        .to_bytes();

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(&body)
        .map_err(|e| SessionGateError::Validation(format!("Invalid JSON body: {}", e)))
}

/// Value of the first `name=` pair in a query string, percent-decoded
fn query_param(query: &str, name: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| {
            let value = value.replace('+', " ");
            urlencoding::decode(&value)
                .map(|decoded| decoded.into_owned())
                .unwrap_or(value)
        })
}
