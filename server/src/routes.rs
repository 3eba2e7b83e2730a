use std::collections::HashMap;
use std::path::Path as FsPath;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use mc_connect4::{
    best_move_for, Difficulty, DifficultyConfig, GameError, MoveRequest, Rules, Search,
    SearchConfig, Session, SessionView, TurnReport,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

type SharedSession = Arc<Mutex<Session>>;

/// Bounds on the live session map. Sessions idle longer than `idle_timeout`
/// are dropped when a new one is created, and the least recently used go
/// first once `max_sessions` is reached.
#[derive(Copy, Clone, Debug)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub idle_timeout: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: 1024,
            idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    rules: Rules,
    difficulty: Difficulty,
    search: Search,
    limits: SessionLimits,
    sessions: Mutex<HashMap<u64, SessionEntry>>,
    next_id: AtomicU64,
}

struct SessionEntry {
    session: SharedSession,
    last_used: Instant,
}

impl AppState {
    pub fn new(
        rules: Rules,
        difficulty: DifficultyConfig,
        search: SearchConfig,
        limits: SessionLimits,
    ) -> Result<Self, GameError> {
        Ok(Self {
            inner: Arc::new(Inner {
                rules,
                difficulty: Difficulty::new(difficulty)?,
                search: Search::new(search)?,
                limits,
                sessions: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        })
    }

    fn sessions(&self) -> std::sync::MutexGuard<'_, HashMap<u64, SessionEntry>> {
        self.inner
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn create_session(&self) -> (u64, SessionView) {
        let session = Session::new(
            self.inner.rules,
            self.inner.difficulty.clone(),
            self.inner.search.clone(),
        );
        let view = session.view();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let now = Instant::now();

        let mut sessions = self.sessions();
        let evicted = evict(&mut sessions, self.inner.limits, now);
        sessions.insert(
            id,
            SessionEntry {
                session: Arc::new(Mutex::new(session)),
                last_used: now,
            },
        );
        info!(id, evicted, live = sessions.len(), "created session");
        (id, view)
    }

    fn session(&self, id: u64) -> Result<SharedSession, ApiError> {
        let mut sessions = self.sessions();
        let entry = sessions
            .get_mut(&id)
            .ok_or_else(|| ApiError::not_found(format!("no session with id {id}")))?;
        entry.last_used = Instant::now();
        Ok(Arc::clone(&entry.session))
    }

    fn remove_session(&self, id: u64) -> bool {
        self.sessions().remove(&id).is_some()
    }
}

/// Drops idle sessions, then the least recently used until there is room
/// for one more. Returns how many were removed.
fn evict(sessions: &mut HashMap<u64, SessionEntry>, limits: SessionLimits, now: Instant) -> usize {
    let before = sessions.len();
    sessions.retain(|_, entry| now.duration_since(entry.last_used) < limits.idle_timeout);
    while sessions.len() >= limits.max_sessions.max(1) {
        let Some(oldest) = sessions
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(&id, _)| id)
        else {
            break;
        };
        sessions.remove(&oldest);
    }
    before - sessions.len()
}

/// Runs `f` against a session on the blocking pool, so a search holding the
/// session lock never parks an async worker.
async fn with_session<T, F>(state: &AppState, id: u64, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut Session) -> Result<T, GameError> + Send + 'static,
    T: Send + 'static,
{
    let session = state.session(id)?;
    let out = tokio::task::spawn_blocking(move || {
        let mut guard = session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    })
    .await??;
    Ok(out)
}

pub fn app_router(state: AppState, static_dir: Option<&FsPath>) -> Router {
    let api = Router::new()
        .route("/move", get(handle_move))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/moves", post(play_move))
        .route("/sessions/:id/new-game", post(new_game))
        .route("/sessions/:id/samples", put(set_samples))
        .with_state(state);
    let mut router = Router::new().nest("/api", api);
    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
    }
    router
        .layer(
            CorsLayer::new()
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::DELETE,
                ])
                .allow_origin(axum::http::HeaderValue::from_static("*"))
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Deserialize)]
struct MoveQuery {
    #[serde(default)]
    position: String,
    samples: u32,
}

async fn handle_move(
    State(state): State<AppState>,
    Query(query): Query<MoveQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let req = MoveRequest {
        position: query.position,
        samples: query.samples,
    };
    let search = state.inner.search.clone();
    let mv = tokio::task::spawn_blocking(move || best_move_for(&req, &search, &mut rand::rng()))
        .await??;
    let headers = [(header::CACHE_CONTROL, "no-store")];
    Ok((headers, Json(mv)))
}

#[derive(Debug, Serialize)]
struct SessionCreated {
    id: u64,
    #[serde(flatten)]
    view: SessionView,
}

async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let (id, view) = state.create_session();
    (StatusCode::CREATED, Json(SessionCreated { id, view }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<SessionView>, ApiError> {
    let view = with_session(&state, id, |session| Ok(session.view())).await?;
    Ok(Json(view))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    if state.remove_session(id) {
        info!(id, "deleted session");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("no session with id {id}")))
    }
}

#[derive(Debug, Deserialize)]
struct PlayBody {
    column: usize,
}

#[derive(Debug, Serialize)]
struct TurnResponse {
    turn: TurnReport,
    session: SessionView,
}

async fn play_move(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<PlayBody>,
) -> Result<impl IntoResponse, ApiError> {
    let response = with_session(&state, id, move |session| {
        let turn = session.human_move(body.column, &mut rand::rng())?;
        Ok(TurnResponse {
            turn,
            session: session.view(),
        })
    })
    .await?;
    let headers = [(header::CACHE_CONTROL, "no-store")];
    Ok((headers, Json(response)))
}

async fn new_game(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<SessionView>, ApiError> {
    let view = with_session(&state, id, |session| {
        session.new_game();
        Ok(session.view())
    })
    .await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
struct SamplesBody {
    samples: u32,
}

async fn set_samples(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<SamplesBody>,
) -> Result<Json<SessionView>, ApiError> {
    let view = with_session(&state, id, move |session| {
        session.set_samples(body.samples);
        Ok(session.view())
    })
    .await?;
    Ok(Json(view))
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    error: anyhow::Error,
}

impl ApiError {
    fn not_found(message: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: anyhow::anyhow!(message),
        }
    }
}

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        let error = err.into();
        let status = if error.is::<GameError>() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self { status, error }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = format!("{}", self.error);
        (self.status, body).into_response()
    }
}
