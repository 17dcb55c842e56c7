use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        extractors::AdminUser,
        handlers::is_valid_email,
        password::hash_password,
    },
    error::ApiError,
    state::AppState,
    users::{
        dto::{CreateUserRequest, UpdateUserRequest},
        repo::{Role, User, UserUpdate},
    },
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users).post(create_user))
        .route("/admin/users/:id", put(update_user).delete(delete_user))
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::Validation("Invalid id".into()))
}

#[instrument(skip(state, session), fields(admin_id = %session.0.sub))]
pub async fn list_users(
    State(state): State<AppState>,
    session: AdminUser,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = User::list_active_excluding(&state.db, session.0.sub).await?;
    Ok(Json(users))
}

#[instrument(skip(state, session, payload), fields(admin_id = %session.0.sub))]
pub async fn create_user(
    State(state): State<AppState>,
    session: AdminUser,
    Json(mut payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.name.trim().is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation("Missing fields".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::Validation("Password too short".into()));
    }

    let hash = hash_password(&payload.password).map_err(ApiError::Internal)?;
    let role = Role::coerce(payload.role.as_deref());
    let user = User::create(&state.db, payload.name.trim(), &payload.email, &hash, role).await?;

    info!(user_id = %user.id, email = %user.email, "admin created user");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, session, payload), fields(admin_id = %session.0.sub))]
pub async fn update_user(
    State(state): State<AppState>,
    session: AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let id = parse_id(&id)?;
    if id == session.0.sub {
        return Err(ApiError::Validation("Cannot edit self here".into()));
    }

    let payload = payload.normalized();
    let mut fields = UserUpdate {
        name: payload.name,
        email: payload.email.map(|e| e.trim().to_lowercase()),
        password_hash: None,
        role: payload.role.as_deref().map(|r| Role::coerce(Some(r))),
    };
    if let Some(email) = &fields.email {
        if !is_valid_email(email) {
            return Err(ApiError::Validation("Invalid email".into()));
        }
    }
    if let Some(password) = &payload.password {
        fields.password_hash = Some(hash_password(password).map_err(ApiError::Internal)?);
    }

    let updated = User::update(&state.db, id, &fields).await?;
    if !updated {
        warn!(target_id = %id, "update matched no active row");
        return Err(ApiError::NotFound("Update failed".into()));
    }

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Update failed".into()))?;

    info!(target_id = %id, "admin updated user");
    Ok(Json(user))
}

#[instrument(skip(state, session), fields(admin_id = %session.0.sub))]
pub async fn delete_user(
    State(state): State<AppState>,
    session: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    if id == session.0.sub {
        return Err(ApiError::Validation("Cannot delete self".into()));
    }

    let deleted = User::soft_delete(&state.db, id).await?;
    if !deleted {
        warn!(target_id = %id, "delete matched no active row");
        return Err(ApiError::NotFound("Delete failed".into()));
    }

    info!(target_id = %id, "admin soft-deleted user");
    Ok(Json(json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::Claims;

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(parse_id("not-a-uuid").is_err());
        assert!(parse_id("").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).expect("parse"), id);
    }

    fn admin_session() -> AdminUser {
        AdminUser(Claims {
            sub: Uuid::new_v4(),
            email: "admin@example.com".into(),
            name: "Admin".into(),
            role: Role::Admin,
            iat: 0,
            exp: usize::MAX,
        })
    }

    #[tokio::test]
    async fn admin_create_rejects_short_password() {
        let state = AppState::fake();
        let payload = CreateUserRequest {
            name: "Bob".into(),
            email: "bob@example.com".into(),
            password: "short".into(),
            role: None,
        };
        let err = create_user(State(state), admin_session(), Json(payload))
            .await
            .err()
            .expect("should reject");
        match err {
            ApiError::Validation(msg) => assert_eq!(msg, "Password too short"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn admin_create_rejects_missing_fields() {
        let state = AppState::fake();
        let payload = CreateUserRequest {
            name: "".into(),
            email: "bob@example.com".into(),
            password: "long-enough".into(),
            role: None,
        };
        let err = create_user(State(state), admin_session(), Json(payload))
            .await
            .err()
            .expect("should reject");
        match err {
            ApiError::Validation(msg) => assert_eq!(msg, "Missing fields"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
