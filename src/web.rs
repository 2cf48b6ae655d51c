// Data Access Agent - Web front-end
// One SessionState per browser (cookie), HTML rendered from PageView

use axum::{
    extract::{Form, Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::artifacts::{ArtifactCreator, SimulatedArtifactCreator};
use crate::catalog::AccessGroup;
use crate::error::{AgentError, AgentResult};
use crate::forms::{parse_business_date, BusinessDateControl, FormKind, FormSubmission, FormView};
use crate::history::{HistoryKind, HistoryProvider};
use crate::render::{render, HistoryView, PageView, PanelView};
use crate::router::RequestRouter;
use crate::session::SessionState;

pub const SESSION_COOKIE: &str = "data_agent_session";
pub const MAX_SESSIONS: usize = 10_000;
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

struct SessionEntry {
    state: SessionState,
    last_seen: Instant,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    sessions: Arc<Mutex<HashMap<Uuid, SessionEntry>>>,
    max_sessions: usize,
    idle_ttl: Duration,
    router: Arc<RequestRouter>,
    history: Arc<dyn HistoryProvider>,
    creator: Arc<dyn ArtifactCreator>,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl AppState {
    pub fn new(router: RequestRouter, history: Arc<dyn HistoryProvider>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            max_sessions: MAX_SESSIONS,
            idle_ttl: SESSION_IDLE_TTL,
            router: Arc::new(router),
            history,
            creator: Arc::new(SimulatedArtifactCreator),
            today: local_today,
        }
    }

    pub fn with_creator(mut self, creator: Arc<dyn ArtifactCreator>) -> Self {
        self.creator = creator;
        self
    }

    /// Override the clock used for default business dates
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Cap the session store and how long an untouched session survives
    pub fn with_session_limits(mut self, max_sessions: usize, idle_ttl: Duration) -> Self {
        self.max_sessions = max_sessions.max(1);
        self.idle_ttl = idle_ttl;
        self
    }

    pub fn session_count(&self) -> usize {
        self.lock_sessions().len()
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<Uuid, SessionEntry>> {
        // A panicking handler cannot leave a session half-mutated: every
        // action is a single call on SessionState.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look at the caller's session without creating one.
    /// Unknown callers see a fresh Idle session.
    fn view_session<R>(&self, jar: &CookieJar, view: impl FnOnce(&SessionState) -> R) -> R {
        let mut sessions = self.lock_sessions();
        match session_id(jar).and_then(|id| sessions.get_mut(&id)) {
            Some(entry) => {
                entry.last_seen = Instant::now();
                view(&entry.state)
            }
            None => view(&SessionState::new()),
        }
    }

    /// Run one action against an existing session; unknown callers are left alone
    fn update_session(&self, jar: &CookieJar, action: impl FnOnce(&mut SessionState)) {
        let mut sessions = self.lock_sessions();
        if let Some(entry) = session_id(jar).and_then(|id| sessions.get_mut(&id)) {
            entry.last_seen = Instant::now();
            action(&mut entry.state);
        }
    }

    /// Run one action against the caller's session, creating it if needed.
    /// The returned jar carries the cookie for a new session.
    fn with_session<R>(
        &self,
        jar: CookieJar,
        action: impl FnOnce(&mut SessionState) -> R,
    ) -> (CookieJar, R) {
        let mut sessions = self.lock_sessions();
        let now = Instant::now();

        let (jar, id) = match session_id(&jar) {
            Some(id) if sessions.contains_key(&id) => (jar, id),
            _ => {
                self.make_room(&mut sessions, now);
                let id = Uuid::new_v4();
                tracing::debug!(session = %id, "session started");
                (jar.add(session_cookie(id)), id)
            }
        };

        let entry = sessions.entry(id).or_insert_with(|| SessionEntry {
            state: SessionState::new(),
            last_seen: now,
        });
        entry.last_seen = now;
        let result = action(&mut entry.state);
        (jar, result)
    }

    /// Drop idle sessions, then the least recently seen until one more fits
    fn make_room(&self, sessions: &mut HashMap<Uuid, SessionEntry>, now: Instant) {
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < self.idle_ttl);

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                    tracing::debug!(session = %id, "session evicted");
                }
                None => break,
            }
        }
    }

    fn render_page(&self, session: &SessionState) -> PageView {
        render(session, self.history.as_ref(), (self.today)())
    }
}

fn session_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

fn session_cookie(id: Uuid) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        let status = match &self {
            AgentError::RecordNotFound { .. } => StatusCode::NOT_FOUND,
            AgentError::UnknownAccessGroup(_)
            | AgentError::UnknownHistoryKind(_)
            | AgentError::UnknownFormKind(_)
            | AgentError::InvalidDate(_) => StatusCode::BAD_REQUEST,
            AgentError::Dataset(_) | AgentError::Csv(_) | AgentError::Io(_) => {
                tracing::error!(error = %self, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ApiResponse {
            success: false,
            data: (),
            error: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    request: String,
}

/// GET / - Render the page for this session
async fn index(State(state): State<AppState>, jar: CookieJar) -> Html<String> {
    let page = state.view_session(&jar, |session| state.render_page(session));
    Html(render_html(&page))
}

/// POST /ask - Submit a request
async fn ask(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<AskForm>,
) -> (CookieJar, Redirect) {
    let (jar, outcome) = state.with_session(jar, |session| {
        session.set_input(form.request);
        session.submit(&state.router)
    });

    if let Some(outcome) = outcome {
        tracing::info!(panel = ?outcome.panel, rule = ?outcome.rule_id, "request submitted");
    }
    (jar, Redirect::to("/"))
}

/// POST /start-over - Reset the session
async fn start_over(State(state): State<AppState>, jar: CookieJar) -> Redirect {
    state.update_session(&jar, SessionState::start_over);
    Redirect::to("/")
}

/// POST /forms/:kind - Submit a field-selection form
async fn submit_form(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    jar: CookieJar,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Html<String>, AgentError> {
    let kind: FormKind = kind.parse()?;
    let today = (state.today)();
    let submission = parse_submission(kind, &fields, today)?;
    let confirmation = state.creator.create(&submission);

    let form = FormView::build(kind, &BTreeSet::new(), today).with_submission(&submission);
    let page = state
        .view_session(&jar, |session| state.render_page(session))
        .with_form(form)
        .with_confirmation(Some(&confirmation));

    Ok(Html(render_html(&page)))
}

/// GET /history/:kind/:name - Download one history row as CSV
async fn download_row(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<Response, AgentError> {
    let kind: HistoryKind = kind.parse()?;
    let export = state.history.export(kind, &name)?;

    let disposition = format!("attachment; filename=\"{}\"", export.file_name.replace('"', ""));
    let mut response = (StatusCode::OK, export.body).into_response();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(export.content_type));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response.headers_mut().insert(CONTENT_DISPOSITION, value);
    }

    Ok(response)
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/page - Rendered page as JSON
async fn page_json(State(state): State<AppState>, jar: CookieJar) -> Json<ApiResponse<PageView>> {
    let page = state.view_session(&jar, |session| state.render_page(session));
    Json(ApiResponse::ok(page))
}

/// Turn posted form pairs into a submission.
/// `field` repeats once per checked box; the API form always uses today.
pub fn parse_submission(
    kind: FormKind,
    fields: &[(String, String)],
    today: NaiveDate,
) -> AgentResult<FormSubmission> {
    let value = |key: &str| {
        fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    let business_date = match (kind.has_date_picker(), value("business_date")) {
        (true, Some(date)) if !date.is_empty() => parse_business_date(date)?,
        _ => today,
    };

    let access_group = match value("access_group") {
        Some(group) => group.parse::<AccessGroup>()?,
        None => AccessGroup::default(),
    };

    // An empty name is still a name; only a missing field takes the default
    let name = value("name").map(str::to_string);

    let checked = fields
        .iter()
        .filter(|(k, _)| k == "field")
        .map(|(_, v)| v.as_str());

    Ok(FormSubmission::new(kind, business_date, checked, access_group, name))
}

// ============================================================================
// HTML
// ============================================================================

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_html(page: &PageView) -> String {
    let mut html = String::new();

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head><body>\n\
         <h1>{title}</h1>\n\
         <form method=\"post\" action=\"/ask\">\n\
         <label for=\"request\">{label}</label>\n\
         <input id=\"request\" name=\"request\" type=\"text\" value=\"{input}\">\n\
         <button type=\"submit\">Submit</button>\n</form>\n",
        title = escape(page.title),
        label = escape(page.input_label),
        input = escape(&page.input_text),
    );

    if let Some(exchange) = &page.last_exchange {
        let _ = write!(
            html,
            "<hr>\n<p><strong>You:</strong> {}</p>\n<p><strong>Agent:</strong> {}</p>\n",
            escape(&exchange.request),
            escape(&exchange.response)
        );
    }

    match &page.panel {
        Some(PanelView::Form(form)) => render_form_html(&mut html, form),
        Some(PanelView::History(history)) => render_history_html(&mut html, history),
        None => {}
    }

    if let Some(notice) = &page.notice {
        let _ = writeln!(html, "<div class=\"success\">{}</div>", escape(notice));
    }

    if page.panel.is_some() {
        let _ = write!(
            html,
            "<form method=\"post\" action=\"/start-over\"><button type=\"submit\">{}</button></form>\n",
            escape(page.start_over_label)
        );
    }

    html.push_str("</body></html>\n");
    html
}

fn render_form_html(html: &mut String, form: &FormView) {
    let _ = write!(
        html,
        "<hr>\n<h2>{}</h2>\n<p class=\"info\">{}</p>\n<form method=\"post\" action=\"/forms/{}\">\n",
        escape(form.heading),
        escape(form.info),
        form.kind.slug()
    );

    match &form.business_date {
        BusinessDateControl::Picker { default } => {
            let _ = writeln!(
                html,
                "<label>Select Business Date <input type=\"date\" name=\"business_date\" value=\"{}\"></label>",
                default.format("%Y-%m-%d")
            );
        }
        BusinessDateControl::Mandatory { label, .. } => {
            let _ = writeln!(
                html,
                "<label><input type=\"checkbox\" checked disabled> {}</label>",
                escape(label)
            );
        }
    }

    for group in &form.groups {
        let _ = writeln!(html, "<fieldset><legend>{}</legend>", escape(group.title));
        for b in &group.boxes {
            let _ = writeln!(
                html,
                "<label><input type=\"checkbox\" id=\"{key}\" name=\"field\" value=\"{field}\"{checked}> {field}</label><br>",
                key = escape(&b.key),
                field = escape(b.field),
                checked = if b.checked { " checked" } else { "" },
            );
        }
        html.push_str("</fieldset>\n");
    }

    html.push_str("<label>Select Access Group <select name=\"access_group\">\n");
    for group in &form.access_groups {
        let _ = writeln!(
            html,
            "<option value=\"{g}\"{selected}>{g}</option>",
            g = group,
            selected = if *group == form.default_access_group { " selected" } else { "" },
        );
    }
    html.push_str("</select></label>\n");

    let field = &form.text_field;
    if field.disabled {
        let _ = writeln!(
            html,
            "<label>{} <input type=\"text\" value=\"{}\" disabled></label>",
            escape(field.label),
            escape(&field.value)
        );
    } else {
        let _ = writeln!(
            html,
            "<label>{} <input type=\"text\" name=\"name\" value=\"{}\"></label>",
            escape(field.label),
            escape(&field.value)
        );
    }

    let _ = write!(
        html,
        "<button type=\"submit\">{}</button>\n</form>\n",
        escape(form.submit_label)
    );
}

fn render_history_html(html: &mut String, history: &HistoryView) {
    let _ = write!(html, "<hr>\n<h2>{}</h2>\n<table>\n<tr>", escape(history.heading));
    for column in &history.columns {
        let _ = write!(html, "<th>{}</th>", escape(column));
    }
    html.push_str("</tr>\n");

    for row in &history.rows {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><a href=\"/history/{}/{}\" download=\"{}\">📄</a></td></tr>",
            escape(&row.record.name),
            escape(&row.record.access_timestamp),
            escape(&row.record.accessed_by),
            escape(&row.record.business_date),
            history.kind.slug(),
            urlencoding::encode(&row.record.name),
            escape(&row.download_file),
        );
    }
    html.push_str("</table>\n");
}

// ============================================================================
// Router
// ============================================================================

pub fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/page", get(page_json))
        .with_state(state.clone());

    Router::new()
        .route("/", get(index))
        .route("/ask", post(ask))
        .route("/start-over", post(start_over))
        .route("/forms/:kind", post(submit_form))
        .route("/history/:kind/:name", get(download_row))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Tests
// ============================================================================
