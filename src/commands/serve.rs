use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use axum::extract::rejection::FormRejection;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::purge_expired::spawn_sweep;
use crate::auth::{cookie_name, TOKEN_MAX_AGE_SECS};
use crate::controllers::paste::{self, NewPaste};
use crate::types::api::{AuthPaste, CreatePaste, CreatedPaste, PasteView, Purged, UpdatePaste};
use crate::App;

pub async fn run(app: App) -> anyhow::Result<()> {
    app.config.warn_insecure();

    let interval = Duration::from_secs(app.config.limits.sweep_interval_secs.max(1));
    spawn_sweep(app.clone(), interval);

    let addr = SocketAddr::new(app.config.bind, app.config.port);
    let public = axum::Server::try_bind(&addr)
        .with_context(|| format!("failed to bind {addr}"))?
        .serve(router(app.clone()).into_make_service());
    info!("listening on {addr}");

    match app.config.admin_port {
        Some(port) => {
            let admin_addr = SocketAddr::new(app.config.bind, port);
            let admin = axum::Server::try_bind(&admin_addr)
                .with_context(|| format!("failed to bind {admin_addr}"))?
                .serve(admin_router(app).into_make_service());
            info!("admin listening on {admin_addr}");
            tokio::try_join!(public, admin)?;
        }
        None => public.await?,
    }

    Ok(())
}

/// The public API, plus the UI directory if one is configured.
pub fn router(app: App) -> Router {
    let mut router = Router::new()
        .route("/_health", get(health))
        .route("/api/p", post(create_paste))
        .route(
            "/api/p/:id",
            get(get_paste).post(update_paste).delete(delete_paste),
        )
        .route("/api/p/:id/auth", post(auth_paste))
        .route("/api/raw/:id", get(get_raw));

    if let Some(dir) = &app.config.ui.dir {
        // unknown paths belong to the single page app
        let index = ServeFile::new(dir.join("index.html"));
        router = router.fallback_service(ServeDir::new(dir).fallback(index));
    }

    router
        .layer(DefaultBodyLimit::max(app.config.max_body_size()))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

/// Maintenance endpoints. Meant to be bound to a local-only address.
pub fn admin_router(app: App) -> Router {
    Router::new()
        .route("/admin", get(admin_list))
        .route("/admin/delete/:id", post(admin_delete))
        .route("/admin/purge", post(admin_purge))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

fn auth_token<'a>(jar: &'a CookieJar, id: &str) -> Option<&'a str> {
    jar.get(&cookie_name(id)).map(|cookie| cookie.value())
}

async fn create_paste(
    State(app): State<App>,
    form: Result<Form<CreatePaste>, FormRejection>,
) -> crate::ApiResult<Json<CreatedPaste>> {
    let Form(form) = form?;
    let paste = paste::create(&app, NewPaste::try_from(form)?).await?;
    Ok(Json(CreatedPaste { id: paste.id }))
}

async fn get_paste(
    State(app): State<App>,
    Path(id): Path<String>,
    jar: CookieJar,
) -> crate::ApiResult<Json<PasteView>> {
    let paste = paste::get(&app, &id, auth_token(&jar, &id)).await?;
    Ok(Json(paste.into()))
}

async fn get_raw(
    State(app): State<App>,
    Path(id): Path<String>,
    jar: CookieJar,
) -> crate::ApiResult<impl IntoResponse> {
    let paste = paste::get(&app, &id, auth_token(&jar, &id)).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        paste.content,
    ))
}

async fn update_paste(
    State(app): State<App>,
    Path(id): Path<String>,
    jar: CookieJar,
    form: Result<Form<UpdatePaste>, FormRejection>,
) -> crate::ApiResult<StatusCode> {
    let Form(form) = form?;
    paste::update(&app, &id, &form.content, auth_token(&jar, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_paste(
    State(app): State<App>,
    Path(id): Path<String>,
) -> crate::ApiResult<StatusCode> {
    paste::delete(&app, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn auth_paste(
    State(app): State<App>,
    Path(id): Path<String>,
    jar: CookieJar,
    form: Result<Form<AuthPaste>, FormRejection>,
) -> crate::ApiResult<impl IntoResponse> {
    let Form(form) = form?;
    let token = paste::authenticate(&app, &id, &form.password).await?;

    let cookie = Cookie::build(cookie_name(&id), token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(TOKEN_MAX_AGE_SECS))
        .finish();

    Ok((jar.add(cookie), StatusCode::NO_CONTENT))
}

async fn admin_list(State(app): State<App>) -> crate::ApiResult<impl IntoResponse> {
    Ok(Json(paste::list_recent(&app).await?))
}

async fn admin_delete(
    State(app): State<App>,
    Path(id): Path<String>,
) -> crate::ApiResult<StatusCode> {
    paste::delete_any(&app, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn admin_purge(State(app): State<App>) -> crate::ApiResult<Json<Purged>> {
    let purged = paste::purge_expired(&app).await?;
    Ok(Json(Purged { purged }))
}
