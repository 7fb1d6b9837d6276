use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use rust_embed::RustEmbed;
use serde::Deserialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::explorer::Explorer;
use crate::html;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

#[derive(Clone)]
struct AppState {
    explorer: Arc<Explorer>,
}

pub fn router(explorer: Arc<Explorer>, cfg: &Config) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/files", get(browse))
        .route("/upload", post(upload))
        .route("/delete", post(remove))
        .route("/link", get(link))
        .route("/folder", post(new_folder))
        .route("/assets/{*path}", get(asset))
        .layer(DefaultBodyLimit::max(cfg.upload_limit_bytes()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CatchPanicLayer::new())
        .layer(CompressionLayer::new())
        .with_state(AppState { explorer })
}

/// 处理器内部错误统一转 500，浏览器侧状态不受影响
struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("请求处理失败: {:#}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, format!("内部错误: {}", self.0)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

async fn index() -> Redirect {
    Redirect::to("/files")
}

#[derive(Deserialize)]
struct BrowseQuery {
    prefix: Option<String>,
}

async fn browse(State(st): State<AppState>, Query(q): Query<BrowseQuery>) -> Html<String> {
    match q.prefix {
        Some(prefix) => st.explorer.navigate(&prefix).await,
        None => st.explorer.refresh().await,
    }
    Html(html::render_page(&st.explorer.snapshot()))
}

async fn upload(
    State(st): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    while let Some(field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if file_name.is_empty() {
            continue;
        }
        let data = field.bytes().await?;
        st.explorer.upload(&file_name, data).await;
    }
    Ok(back_to_listing(&st.explorer))
}

#[derive(Deserialize)]
struct DeleteForm {
    key: String,
}

async fn remove(State(st): State<AppState>, Form(form): Form<DeleteForm>) -> Redirect {
    st.explorer.delete(&form.key).await;
    back_to_listing(&st.explorer)
}

#[derive(Deserialize)]
struct LinkQuery {
    key: String,
}

async fn link(State(st): State<AppState>, Query(q): Query<LinkQuery>) -> Redirect {
    match st.explorer.entry(&q.key) {
        Some(entry) => {
            st.explorer.temporary_url(&entry).await;
        }
        None => st.explorer.notice_error("对象不存在或列表已过期"),
    }
    back_to_listing(&st.explorer)
}

#[derive(Deserialize)]
struct FolderForm {
    name: String,
}

async fn new_folder(State(st): State<AppState>, Form(form): Form<FolderForm>) -> Redirect {
    st.explorer.create_folder(&form.name).await;
    back_to_listing(&st.explorer)
}

async fn asset(Path(path): Path<String>) -> Response {
    match Assets::get(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// 动作完成后 303 跳回当前前缀的列表页
fn back_to_listing(explorer: &Explorer) -> Redirect {
    let prefix = explorer.current_prefix();
    Redirect::to(&format!(
        "/files?prefix={}",
        utf8_percent_encode(&prefix, NON_ALPHANUMERIC)
    ))
}
