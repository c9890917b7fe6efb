use axum::extract::{Extension, Path, State};
use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use danke_domain::{
    access::BoardAccess,
    boards::{Board, BoardCreate, BoardUpdate, BoardVisibility, ModeratorGrant, PostingMode},
    error::DomainError,
    identity::ActorIdentity,
    posts::{Post, PostContent, PostCreate, Submission},
};

use crate::middleware::AuthContext;
use crate::{error::ApiError, middleware as app_middleware, state::AppState, validation};

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/v1/boards", post(create_board))
        .route(
            "/v1/boards/:board_id/moderators",
            post(add_moderator).get(list_moderators),
        )
        .route(
            "/v1/boards/:board_id/moderators/:user_id",
            axum::routing::delete(remove_moderator),
        )
        .route("/v1/posts/:post_id/approve", post(approve_post))
        .route("/v1/posts/:post_id/request-change", post(request_change))
        .route(
            "/v1/posts/:post_id/schedule-deletion",
            post(schedule_deletion),
        )
        .route("/v1/posts/:post_id/delete", post(moderator_delete_post))
        .route_layer(middleware::from_fn(app_middleware::require_auth_middleware));

    // Reads stay open so anonymous viewers reach public boards; the mutating
    // verbs on the shared paths resolve their own actor and reject missing
    // credentials in the handler.
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route(
            "/v1/boards/:board_id",
            get(get_board).patch(update_board).delete(delete_board),
        )
        .route("/v1/boards/:board_id/access", get(board_access))
        .route(
            "/v1/boards/:board_id/posts",
            get(list_posts).post(submit_post),
        )
        .route("/v1/posts/:post_id", get(get_post).delete(delete_own_post))
        .merge(protected)
        .layer(app_middleware::timeout_layer())
        .layer(app_middleware::trace_layer())
        .layer(app_middleware::set_request_id_layer())
        .layer(app_middleware::propagate_request_id_layer())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth_middleware,
        ))
        .layer(middleware::from_fn(
            app_middleware::correlation_id_middleware,
        ))
        .layer(middleware::from_fn(app_middleware::metrics_layer));

    if !state.config.app_env.eq_ignore_ascii_case("test") {
        app = app.layer(app_middleware::rate_limit_layer());
    }

    app.with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.app_env.clone(),
    })
}

async fn metrics() -> Result<Response, ApiError> {
    let rendered = crate::observability::render_metrics().ok_or(ApiError::Internal)?;
    Ok((StatusCode::OK, rendered).into_response())
}

fn default_true() -> bool {
    true
}

fn default_visibility() -> BoardVisibility {
    BoardVisibility::Public
}

#[derive(Debug, Deserialize, Validate)]
struct CreateBoardRequest {
    #[validate(length(min = 1, max = 200))]
    title: String,
    #[validate(length(min = 1, max = 120))]
    recipient_name: String,
    posting_mode: PostingMode,
    max_posts_per_user: Option<u32>,
    #[serde(default = "default_true")]
    moderation_enabled: bool,
    #[serde(default = "default_true")]
    allow_anonymous: bool,
    #[serde(default = "default_visibility")]
    visibility: BoardVisibility,
    expires_at_ms: Option<i64>,
}

async fn create_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateBoardRequest>,
) -> Result<Response, ApiError> {
    validation::validate(&payload)?;
    let actor = actor_identity(&auth)?;
    let input = BoardCreate {
        title: payload.title,
        recipient_name: payload.recipient_name,
        posting_mode: payload.posting_mode,
        max_posts_per_user: payload.max_posts_per_user,
        moderation_enabled: payload.moderation_enabled,
        allow_anonymous: payload.allow_anonymous,
        visibility: payload.visibility,
        expires_at_ms: payload.expires_at_ms,
    };
    let board = state
        .boards
        .create(&actor, input)
        .await
        .map_err(map_domain_error)?;
    Ok((StatusCode::CREATED, Json(board)).into_response())
}

async fn get_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<String>,
) -> Result<Json<Board>, ApiError> {
    let actor = optional_actor(&auth);
    let board = load_board(&state, &board_id).await?;
    ensure_board_access(&state, &board, actor.as_ref()).await?;
    Ok(Json(board))
}

#[derive(Debug, Deserialize, Validate)]
struct UpdateBoardRequest {
    #[validate(length(min = 1, max = 200))]
    title: Option<String>,
    #[validate(length(min = 1, max = 120))]
    recipient_name: Option<String>,
    posting_mode: Option<PostingMode>,
    max_posts_per_user: Option<u32>,
    moderation_enabled: Option<bool>,
    allow_anonymous: Option<bool>,
    visibility: Option<BoardVisibility>,
    expires_at_ms: Option<i64>,
}

async fn update_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<String>,
    Json(payload): Json<UpdateBoardRequest>,
) -> Result<Json<Board>, ApiError> {
    validation::validate(&payload)?;
    let actor = actor_identity(&auth)?;
    let update = BoardUpdate {
        title: payload.title,
        recipient_name: payload.recipient_name,
        posting_mode: payload.posting_mode,
        max_posts_per_user: payload.max_posts_per_user,
        moderation_enabled: payload.moderation_enabled,
        allow_anonymous: payload.allow_anonymous,
        visibility: payload.visibility,
        expires_at_ms: payload.expires_at_ms,
    };
    let board = state
        .boards
        .update(&actor, &board_id, update)
        .await
        .map_err(map_domain_error)?;
    state.board_cache.invalidate(&board_id).await;
    Ok(Json(board))
}

async fn delete_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let actor = actor_identity(&auth)?;
    state
        .boards
        .delete(&actor, &board_id)
        .await
        .map_err(map_domain_error)?;
    state.board_cache.invalidate(&board_id).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn board_access(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<String>,
) -> Result<Json<BoardAccess>, ApiError> {
    let actor = optional_actor(&auth);
    let board = load_board(&state, &board_id).await?;
    let access = state
        .access
        .check_access(&board, actor.as_ref())
        .await
        .map_err(map_domain_error)?;
    Ok(Json(access))
}

#[derive(Debug, Deserialize, Validate)]
struct AddModeratorRequest {
    #[validate(length(min = 1, max = 128))]
    user_id: String,
}

async fn add_moderator(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<String>,
    Json(payload): Json<AddModeratorRequest>,
) -> Result<Response, ApiError> {
    validation::validate(&payload)?;
    let actor = actor_identity(&auth)?;
    let grant = state
        .boards
        .add_moderator(&actor, &board_id, &payload.user_id)
        .await
        .map_err(map_domain_error)?;
    Ok((StatusCode::CREATED, Json(grant)).into_response())
}

async fn list_moderators(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<String>,
) -> Result<Json<Vec<ModeratorGrant>>, ApiError> {
    let actor = actor_identity(&auth)?;
    let grants = state
        .boards
        .list_moderators(&actor, &board_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(grants))
}

async fn remove_moderator(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((board_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let actor = actor_identity(&auth)?;
    state
        .boards
        .remove_moderator(&actor, &board_id, &user_id)
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct SubmitPostRequest {
    content: serde_json::Value,
    #[serde(default)]
    is_anonymous: bool,
}

async fn submit_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<String>,
    Json(payload): Json<SubmitPostRequest>,
) -> Result<Response, ApiError> {
    let actor = optional_actor(&auth);
    let input = PostCreate {
        content: PostContent::new(payload.content),
        is_anonymous: payload.is_anonymous,
    };
    let submission = state
        .posts
        .submit(actor.as_ref(), &board_id, input)
        .await
        .map_err(map_domain_error)?;
    match submission {
        Submission::Created(post) => Ok((StatusCode::CREATED, Json(post)).into_response()),
        Submission::Denied { reason } => Err(ApiError::ContentRejected(reason)),
    }
}

async fn list_posts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(board_id): Path<String>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let actor = optional_actor(&auth);
    let board = load_board(&state, &board_id).await?;
    ensure_board_access(&state, &board, actor.as_ref()).await?;
    let posts = state
        .posts
        .list_for_board(&board_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(posts))
}

async fn get_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(post_id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    let actor = optional_actor(&auth);
    let post = state.posts.get(&post_id).await.map_err(map_domain_error)?;
    let board = load_board(&state, &post.board_id).await?;
    ensure_board_access(&state, &board, actor.as_ref()).await?;
    Ok(Json(post))
}

async fn delete_own_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(post_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let actor = actor_identity(&auth)?;
    state
        .posts
        .delete_own(&actor, &post_id)
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn approve_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(post_id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    let actor = actor_identity(&auth)?;
    let post = state
        .moderation
        .approve(&actor, &post_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(post))
}

#[derive(Debug, Deserialize, Validate)]
struct RequestChangeRequest {
    #[validate(length(min = 1, max = 500))]
    reason: String,
}

async fn request_change(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(post_id): Path<String>,
    Json(payload): Json<RequestChangeRequest>,
) -> Result<Json<Post>, ApiError> {
    validation::validate(&payload)?;
    let actor = actor_identity(&auth)?;
    let post = state
        .moderation
        .request_change(&actor, &post_id, &payload.reason)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(post))
}

#[derive(Debug, Deserialize, Validate)]
struct ScheduleDeletionRequest {
    delete_at_ms: i64,
    #[validate(length(min = 1, max = 500))]
    reason: String,
}

async fn schedule_deletion(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(post_id): Path<String>,
    Json(payload): Json<ScheduleDeletionRequest>,
) -> Result<Json<Post>, ApiError> {
    validation::validate(&payload)?;
    let actor = actor_identity(&auth)?;
    let post = state
        .moderation
        .schedule_deletion(&actor, &post_id, payload.delete_at_ms, &payload.reason)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(post))
}

#[derive(Debug, Default, Deserialize)]
struct DeletePostRequest {
    #[serde(default)]
    reason: Option<String>,
}

async fn moderator_delete_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(post_id): Path<String>,
    payload: Option<Json<DeletePostRequest>>,
) -> Result<Json<Post>, ApiError> {
    let actor = actor_identity(&auth)?;
    let reason = payload.and_then(|Json(body)| body.reason);
    let post = state
        .moderation
        .delete(&actor, &post_id, reason.as_deref())
        .await
        .map_err(map_domain_error)?;
    Ok(Json(post))
}

/// Read-through board lookup; mutations invalidate by id.
async fn load_board(state: &AppState, board_id: &str) -> Result<Board, ApiError> {
    let key = board_id.to_string();
    if let Some(board) = state.board_cache.get(&key).await {
        return Ok(board);
    }
    let board = state.boards.get(board_id).await.map_err(map_domain_error)?;
    state.board_cache.insert(key, board.clone()).await;
    Ok(board)
}

async fn ensure_board_access(
    state: &AppState,
    board: &Board,
    actor: Option<&ActorIdentity>,
) -> Result<(), ApiError> {
    let access = state
        .access
        .check_access(board, actor)
        .await
        .map_err(map_domain_error)?;
    if access.has_access {
        return Ok(());
    }
    match actor {
        None => Err(ApiError::Unauthorized),
        Some(_) => Err(ApiError::Forbidden(
            access
                .reason
                .unwrap_or_else(|| "access denied".to_string()),
        )),
    }
}

fn actor_identity(auth: &AuthContext) -> Result<ActorIdentity, ApiError> {
    let user_id = auth
        .user_id
        .as_ref()
        .filter(|user_id| !user_id.trim().is_empty())
        .ok_or(ApiError::Unauthorized)?;
    Ok(ActorIdentity {
        user_id: user_id.to_string(),
        email: auth.email.clone().unwrap_or_default(),
    })
}

fn optional_actor(auth: &AuthContext) -> Option<ActorIdentity> {
    if !auth.is_authenticated {
        return None;
    }
    actor_identity(auth).ok()
}

fn map_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::Validation(message) => ApiError::Validation(message),
        DomainError::Forbidden(message) => ApiError::Forbidden(message),
        DomainError::NotFound => ApiError::NotFound,
        DomainError::Conflict => ApiError::Conflict,
    }
}
