use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            LoginRequest, LoginResponse, ProfileResponse, RegisterRequest, RegisterResponse,
            VerifyTokenRequest, VerifyTokenResponse,
        },
        extractors::AuthUser,
        services::AuthError,
    },
    error::{AppError, JsonBody},
    state::AuthState,
};

pub fn auth_routes(state: AuthState) -> Router<AuthState> {
    let limited_login = post(login).route_layer(middleware::from_fn_with_state(state, limit_login));
    Router::new()
        .route("/register", post(register))
        .route("/login", limited_login)
        .route("/verify-token", post(verify_token))
        .route("/profile", get(get_profile))
}

/// Fixed-window limiter in front of `/login`, keyed by peer address.
pub async fn limit_login(
    State(state): State<AuthState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = peer
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".into());
    if let Err(retry_after) = state.login_limiter.check(&key) {
        warn!(client = %key, retry_after_secs = retry_after.as_secs(), "login rate limited");
        return Err(AppError::TooManyRequests(
            "Too many requests, please try again later.".into(),
        ));
    }
    Ok(next.run(req).await)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AuthState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let user = state
        .auth
        .register(&payload.user_email, &payload.user_password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully",
            user,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AuthState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (user, token) = state
        .auth
        .login(&payload.user_email, &payload.user_password)
        .await?;
    Ok(Json(LoginResponse {
        message: "Login successful",
        user,
        token,
    }))
}

/// On this service every token problem reads as unauthenticated.
#[instrument(skip(state, auth))]
pub async fn get_profile(
    State(state): State<AuthState>,
    auth: Result<AuthUser, AppError>,
) -> Result<Json<ProfileResponse>, AppError> {
    let AuthUser(claims) = auth.map_err(|e| match e {
        AppError::Forbidden(_) => AppError::Unauthenticated("Invalid or expired token".into()),
        other => other,
    })?;

    let user = state
        .auth
        .get_profile(claims.user_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;
    Ok(Json(ProfileResponse { user }))
}

#[instrument(skip(state, payload))]
pub async fn verify_token(
    State(state): State<AuthState>,
    JsonBody(payload): JsonBody<VerifyTokenRequest>,
) -> Result<Response, AppError> {
    let Some(token) = payload.token.filter(|t| !t.trim().is_empty()) else {
        return Err(AppError::BadRequest("Token is required".into()));
    };

    match state.auth.verify_token(token.trim()).await {
        Ok(claims) => {
            info!(user_id = claims.user_id, "token verified");
            Ok(Json(VerifyTokenResponse::valid(claims)).into_response())
        }
        Err(AuthError::InvalidToken(e)) => {
            warn!(reason = %e, "token verification failed");
            Ok((
                StatusCode::UNAUTHORIZED,
                Json(VerifyTokenResponse::invalid("Invalid token")),
            )
                .into_response())
        }
        Err(AuthError::UserNotFound) => Ok((
            StatusCode::UNAUTHORIZED,
            Json(VerifyTokenResponse::invalid("User not found")),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}
