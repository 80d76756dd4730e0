// Fighter Payment Registry - Web Server
// Classic form-posting CRUD surface over the fighters table, plus the
// status lapse sweep run at startup and on a daily schedule.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use chrono::Local;
use fighter_registry::{
    db, ops, run_sweep, Config, Error, Fighter, FighterForm, PaymentStatus, SearchQuery,
    STATUS_ALL,
};
use rusqlite::Connection;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
}

// ============================================================================
// Form payloads
// ============================================================================

#[derive(Deserialize)]
struct NoticeParams {
    notice: Option<String>,
    kind: Option<String>,
}

#[derive(Deserialize)]
struct AddForm {
    id: String,
    name: String,
    father_name: String,
    status: String,
    registration_date: String,
}

/// The edit page posts one form for three actions; exactly one of the
/// `search` / `update` / `delete` flags is set by the submit button.
#[derive(Deserialize, Default)]
struct EditForm {
    search: Option<String>,
    update: Option<String>,
    delete: Option<String>,
    id: Option<String>,
    name: Option<String>,
    father_name: Option<String>,
    status: Option<String>,
    registration_date: Option<String>,
}

#[derive(Deserialize, Default)]
struct ViewForm {
    search: Option<String>,
    status: Option<String>,
}

// ============================================================================
// Notices
// ============================================================================

/// Redirect to the landing page carrying a one-shot notice.
fn redirect_with_notice(message: &str, kind: &str) -> Redirect {
    let target = format!(
        "/?notice={}&kind={}",
        urlencoding::encode(message),
        kind
    );
    Redirect::to(&target)
}

fn notice_html(notice: Option<(&str, &str)>) -> String {
    match notice {
        Some((message, kind)) => {
            let class = if kind == "success" { "notice success" } else { "notice error" };
            format!(r#"<p class="{}">{}</p>"#, class, escape(message))
        }
        None => String::new(),
    }
}

/// Minimal HTML escaping for user-supplied text.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ============================================================================
// Page rendering
// ============================================================================

fn page(title: &str, notice: Option<(&str, &str)>, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title} - Fighter Registry</title>
<style>
body {{ font-family: sans-serif; max-width: 720px; margin: 2em auto; }}
nav a {{ margin-right: 1em; }}
.notice.success {{ color: #0a6b22; }}
.notice.error {{ color: #a31515; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #ccc; padding: 0.4em 0.6em; text-align: left; }}
label {{ display: block; margin-top: 0.6em; }}
</style>
</head>
<body>
<nav><a href="/">Home</a><a href="/add">Add Fighter</a><a href="/edit">Edit Fighter</a><a href="/view">View Fighters</a></nav>
<h1>{title}</h1>
{notice}
{body}
</body>
</html>"#,
        title = title,
        notice = notice_html(notice),
        body = body,
    ))
}

fn status_options(selected: Option<PaymentStatus>) -> String {
    [PaymentStatus::Paid, PaymentStatus::NotPaid]
        .iter()
        .map(|s| {
            let flag = if selected == Some(*s) { " selected" } else { "" };
            format!(r#"<option value="{0}"{1}>{0}</option>"#, s.as_str(), flag)
        })
        .collect()
}

fn fighter_fields(fighter: Option<&Fighter>) -> String {
    let (name, father, date, status) = match fighter {
        Some(f) => (
            escape(&f.fighter_name),
            escape(&f.father_name),
            f.registration_date.to_string(),
            Some(f.status),
        ),
        None => (String::new(), String::new(), String::new(), None),
    };
    format!(
        r#"<label>Name <input type="text" name="name" value="{name}"></label>
<label>Father's Name <input type="text" name="father_name" value="{father}"></label>
<label>Status <select name="status">{options}</select></label>
<label>Registration Date <input type="date" name="registration_date" value="{date}"></label>"#,
        name = name,
        father = father,
        options = status_options(status),
        date = date,
    )
}

fn render_index(notice: Option<(&str, &str)>) -> Html<String> {
    page(
        "Fighter Payment Registry",
        notice,
        "<p>Register fighters, track their payment status, and review who has lapsed.</p>",
    )
}

fn render_add(notice: Option<(&str, &str)>) -> Html<String> {
    let body = format!(
        r#"<form method="post" action="/add">
<label>Fighter ID <input type="text" name="id"></label>
{fields}
<p><button type="submit">Add</button></p>
</form>"#,
        fields = fighter_fields(None),
    );
    page("Add Fighter", notice, &body)
}

fn render_edit(fighter: Option<&Fighter>, notice: Option<(&str, &str)>) -> Html<String> {
    let mut body = String::from(
        r#"<h2>Search</h2>
<form method="post" action="/edit">
<input type="hidden" name="search" value="1">
<label>Fighter ID <input type="text" name="id"></label>
<label>Name <input type="text" name="name"></label>
<p><button type="submit">Search</button></p>
</form>"#,
    );

    if let Some(f) = fighter {
        body.push_str(&format!(
            r#"<h2>Edit Fighter {id}</h2>
<form method="post" action="/edit">
<input type="hidden" name="update" value="1">
<input type="hidden" name="id" value="{id}">
{fields}
<p><button type="submit">Update</button></p>
</form>
<form method="post" action="/edit">
<input type="hidden" name="delete" value="1">
<input type="hidden" name="id" value="{id}">
<p><button type="submit">Delete</button></p>
</form>"#,
            id = f.fighter_id,
            fields = fighter_fields(Some(f)),
        ));
    }

    page("Edit Fighter", notice, &body)
}

fn render_view(
    fighters: &[Fighter],
    search: &str,
    status: &str,
    notice: Option<(&str, &str)>,
) -> Html<String> {
    let mut rows = String::new();
    for f in fighters {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            f.fighter_id,
            escape(&f.fighter_name),
            escape(&f.father_name),
            f.status,
            f.registration_date,
        ));
    }
    if fighters.is_empty() {
        rows = r#"<tr><td colspan="5">No fighters found.</td></tr>"#.to_string();
    }

    let all_selected = if status == STATUS_ALL || status.is_empty() {
        " selected"
    } else {
        ""
    };
    let body = format!(
        r#"<form method="post" action="/view">
<label>Search <input type="text" name="search" value="{search}"></label>
<label>Status <select name="status">
<option value="All"{all_selected}>All</option>
{options}
</select></label>
<p><button type="submit">Filter</button></p>
</form>
<table>
<tr><th>ID</th><th>Name</th><th>Father's Name</th><th>Status</th><th>Registration Date</th></tr>
{rows}
</table>"#,
        search = escape(search),
        all_selected = all_selected,
        options = status_options(status.parse().ok()),
        rows = rows,
    );
    page("View Fighters", notice, &body)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Landing page, renders any one-shot notice from the query string
async fn index(Query(params): Query<NoticeParams>) -> Html<String> {
    let notice = params
        .notice
        .as_deref()
        .map(|n| (n, params.kind.as_deref().unwrap_or("success")));
    render_index(notice)
}

/// GET /add - Create form
async fn add_form() -> Html<String> {
    render_add(None)
}

/// POST /add - Create a fighter, redirect home with a notice
async fn add_submit(State(state): State<AppState>, Form(form): Form<AddForm>) -> Redirect {
    let fighter_form = FighterForm {
        id: form.id,
        name: form.name,
        father_name: form.father_name,
        status: form.status,
        registration_date: form.registration_date,
    };

    let conn = state.db.lock().unwrap();
    match ops::create(&conn, &fighter_form) {
        Ok(fighter) => {
            info!(fighter_id = fighter.fighter_id, "fighter added");
            redirect_with_notice("Fighter added successfully!", "success")
        }
        Err(Error::DuplicateId(_)) => {
            redirect_with_notice("Error: ID already exists or invalid data!", "error")
        }
        Err(e) => redirect_with_notice(&format!("Error adding fighter: {}", e), "error"),
    }
}

/// GET /edit - Empty search/edit form
async fn edit_form() -> Html<String> {
    render_edit(None, None)
}

/// POST /edit - Dispatch on the search/update/delete flag
async fn edit_submit(State(state): State<AppState>, Form(form): Form<EditForm>) -> Response {
    if form.search.is_some() {
        return edit_search(&state, &form).into_response();
    }
    if form.update.is_some() {
        return edit_update(&state, &form).into_response();
    }
    if form.delete.is_some() {
        return edit_delete(&state, &form).into_response();
    }
    render_edit(None, None).into_response()
}

fn edit_search(state: &AppState, form: &EditForm) -> Html<String> {
    let id_text = form.id.as_deref().map(str::trim).unwrap_or("");
    let id = if id_text.is_empty() {
        None
    } else {
        match id_text.parse::<i64>() {
            Ok(n) => Some(n),
            Err(_) => {
                return render_edit(None, Some(("Fighter ID must be a number!", "error")));
            }
        }
    };

    let conn = state.db.lock().unwrap();
    match ops::find(&conn, id, form.name.as_deref()) {
        Ok(fighter) => render_edit(Some(&fighter), None),
        Err(Error::Validation(_)) => render_edit(
            None,
            Some(("Please provide either ID or Name to search!", "error")),
        ),
        Err(Error::NotFound) => render_edit(None, Some(("Fighter not found!", "error"))),
        Err(e) => render_edit(None, Some((&format!("Error searching: {}", e), "error"))),
    }
}

fn edit_update(state: &AppState, form: &EditForm) -> Redirect {
    let fighter_form = FighterForm {
        id: form.id.clone().unwrap_or_default(),
        name: form.name.clone().unwrap_or_default(),
        father_name: form.father_name.clone().unwrap_or_default(),
        status: form.status.clone().unwrap_or_default(),
        registration_date: form.registration_date.clone().unwrap_or_default(),
    };

    let conn = state.db.lock().unwrap();
    match ops::update(&conn, &fighter_form) {
        Ok(fighter) => {
            info!(fighter_id = fighter.fighter_id, "fighter updated");
            redirect_with_notice("Fighter updated successfully!", "success")
        }
        Err(e) => redirect_with_notice(&format!("Error updating fighter: {}", e), "error"),
    }
}

fn edit_delete(state: &AppState, form: &EditForm) -> Redirect {
    let id = match form.id.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => match text.parse::<i64>() {
            Ok(n) => n,
            Err(_) => return redirect_with_notice("Fighter ID must be a number!", "error"),
        },
        _ => return redirect_with_notice("Fighter ID is required to delete!", "error"),
    };

    let conn = state.db.lock().unwrap();
    match ops::delete(&conn, id) {
        Ok(affected) => {
            info!(fighter_id = id, affected, "fighter deleted");
            redirect_with_notice("Fighter deleted successfully!", "success")
        }
        Err(e) => redirect_with_notice(&format!("Error deleting fighter: {}", e), "error"),
    }
}

/// GET /view - Unfiltered fighter list
async fn view_page(State(state): State<AppState>) -> Html<String> {
    let conn = state.db.lock().unwrap();
    render_list(&conn, "", STATUS_ALL)
}

/// POST /view - Filtered fighter list
async fn view_submit(State(state): State<AppState>, Form(form): Form<ViewForm>) -> Html<String> {
    let search = form.search.as_deref().unwrap_or("");
    let status = form.status.as_deref().unwrap_or(STATUS_ALL);
    let conn = state.db.lock().unwrap();
    render_list(&conn, search, status)
}

fn render_list(conn: &Connection, search: &str, status: &str) -> Html<String> {
    let query = match SearchQuery::from_input(Some(search), Some(status)) {
        Ok(q) => q,
        Err(e) => return render_view(&[], search, status, Some((&e.to_string(), "error"))),
    };
    match fighter_registry::list(conn, &query) {
        Ok(fighters) => render_view(&fighters, search, status, None),
        Err(e) => {
            error!(%e, "listing fighters failed");
            render_view(&[], search, status, Some(("Error loading fighters.", "error")))
        }
    }
}

// ============================================================================
// Sweep scheduling
// ============================================================================

fn run_scheduled_sweep(state: &AppState) {
    let conn = state.db.lock().unwrap();
    if let Err(e) = run_sweep(&conn, Local::now().date_naive()) {
        error!(%e, "scheduled lapse sweep failed");
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("🥊 Fighter Payment Registry - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::from_env();

    // Open database; a schema failure here is fatal by design
    let conn = db::open(&config.db_path)?;
    println!("✓ Database opened: {:?}", config.db_path);

    // Sweep once, synchronously, before serving any request
    let report = run_sweep(&conn, Local::now().date_naive())?;
    println!(
        "✓ Lapse sweep: {} scanned, {} lapsed, {} failed",
        report.scanned,
        report.lapsed,
        report.failures.len()
    );

    // Create shared state
    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
    };

    // Re-run the sweep daily so staleness cannot outlive the process
    let sweep_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(24 * 60 * 60));
        // The first tick fires immediately; the startup sweep covered it
        interval.tick().await;
        loop {
            interval.tick().await;
            run_scheduled_sweep(&sweep_state);
        }
    });

    // Build router
    let app = Router::new()
        .route("/", get(index))
        .route("/add", get(add_form).post(add_submit))
        .route("/edit", get(edit_form).post(edit_submit))
        .route("/view", get(view_page).post(view_submit))
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    println!("\n🚀 Server running on http://{}", config.bind_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;
    Ok(())
}
