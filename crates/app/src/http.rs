use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use quiz_core::model::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use services::{QuizService, QuizServiceError, QuizView, RegistrationForm};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "quiz_session";

#[derive(Clone)]
pub struct AppState {
    quiz: Arc<QuizService>,
}

impl AppState {
    #[must_use]
    pub fn new(quiz: QuizService) -> Self {
        Self {
            quiz: Arc::new(quiz),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnswerForm {
    #[serde(default)]
    option: String,
}

impl AnswerForm {
    fn choice(&self) -> Result<i64, ApiError> {
        self.option
            .trim()
            .parse()
            .map_err(|_| ApiError::InvalidOption {
                raw: self.option.clone(),
            })
    }
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    message: &'static str,
    questions: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/register", post(register))
        .route("/upload", post(upload))
        .route("/quiz", get(quiz))
        .route("/answer", post(answer))
        .route("/logout", post(logout))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn session_id(jar: &CookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse().ok())
}

fn session_cookie(id: SessionId) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

async fn home() -> Json<Value> {
    Json(json!({
        "register": {
            "method": "POST",
            "action": "/register",
            "fields": ["name", "phone", "experience", "company", "notice_period"],
        },
        "upload": {
            "method": "POST",
            "action": "/upload",
            "fields": ["file"],
            "accept": ".xlsx",
        },
    }))
}

async fn health() -> &'static str {
    "ok"
}

async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegistrationForm>,
) -> Result<(CookieJar, Redirect), ApiError> {
    let id = session_id(&jar).unwrap_or_else(SessionId::random);
    state.quiz.register(id, form).await?;
    Ok((jar.add(session_cookie(id)), Redirect::to("/quiz")))
}

async fn quiz(State(state): State<AppState>, jar: CookieJar) -> Result<Response, ApiError> {
    let Some(id) = session_id(&jar) else {
        return Ok(Redirect::to("/").into_response());
    };
    match state.quiz.current(id).await? {
        QuizView::NotStarted => Ok(Redirect::to("/").into_response()),
        view => Ok(Json(view).into_response()),
    }
}

async fn answer(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<AnswerForm>,
) -> Result<Redirect, ApiError> {
    let id = session_id(&jar).ok_or(QuizServiceError::NotStarted)?;
    state.quiz.answer(id, form.choice()?).await?;
    Ok(Redirect::to("/quiz"))
}

async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    if let Some(id) = session_id(&jar) {
        state.quiz.end(id).await?;
    }
    Ok((jar.remove(Cookie::build(SESSION_COOKIE).path("/")), Redirect::to("/")))
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_owned();
        let bytes = field.bytes().await?;

        let questions = state.quiz.upload(&filename, bytes.to_vec()).await?;

        return Ok(Json(UploadResponse {
            message: "File successfully uploaded",
            questions,
        }));
    }
    Err(ApiError::MissingFile)
}
