use std::{
    io,
    sync::{Arc, OnceLock},
    time,
};

use application::{api, storage, Args, Config, Service};
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, MatchedPath},
    Extension,
};
use axum_client_ip::InsecureClientIp;
use service::infra::{postgres, Postgres};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    fmt::MakeWriter,
    layer::{Layer, SubscriberExt as _},
    registry::LookupSpan,
    util::SubscriberInitExt as _,
};

/// Levels written to `stderr` rather than `stdout`.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Maximum level of the logged events, set once [`Config`] is loaded.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(console(io::stdout, false))
        .with(console(io::stderr, true))
        .init();

    _ = start().await;
}

/// Creates a compact console [`Layer`] writing either the [`STDERR_LEVELS`]
/// or all the other levels to the `writer`.
fn console<S, W>(writer: W, stderr: bool) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'s> LookupSpan<'s>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(true)
        .with_thread_names(true)
        .with_writer(writer)
        .with_filter(filter_fn(move |meta| {
            meta.is_span()
                || STDERR_LEVELS.contains(meta.level()) == stderr
                    && LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO)
                        >= *meta.level()
        }))
}

async fn start() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        server,
        service,
        postgres,
        log,
        media,
        site,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let postgres_config = postgres.into();
    let mut postgres = Postgres::new(&postgres_config).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;

    migrations::runner()
        .run_async(&mut postgres)
        .await
        .map_err(|e| {
            log::error!("failed to run database migrations: {e}");
        })?;

    let service = Service::new(service.into(), postgres);
    let storage = storage::Local::new(media.root, media.url_prefix);

    let cors = cors(&server.cors.origins)?;

    let app = api::router()
        .nest_service(
            media_prefix(storage.url_prefix()).as_str(),
            ServeDir::new(storage.root()),
        )
        .layer(DefaultBodyLimit::max(media.max_upload_size))
        .layer(Extension(service))
        .layer(Extension(storage))
        .layer(Extension(Arc::new(site)))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(log_response),
        );

    let listener = TcpListener::bind((server.host.clone(), server.port))
        .await
        .map_err(|e| {
            log::error!(
                "failed to listen on `{}:{}`: {e}",
                server.host,
                server.port,
            );
        })?;

    log::info!("listening on `{}:{}`", server.host, server.port);

    axum::serve(listener, app)
        .await
        .map_err(|e| log::error!("webserver failed: {e}"))
}

/// Creates a [`CorsLayer`] allowing the provided `origins`, or any origin if
/// they contain `*`.
fn cors(origins: &[String]) -> Result<CorsLayer, ()> {
    let layer = CorsLayer::new()
        .allow_methods([
            http::Method::GET,
            http::Method::OPTIONS,
            http::Method::POST,
        ])
        .allow_headers([http::header::CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        return Ok(layer.allow_origin(AllowOrigin::any()));
    }
    let origins = origins
        .iter()
        .map(|origin| {
            origin.parse::<http::HeaderValue>().map_err(|e| {
                log::error!("`{origin}` is not a valid CORS origin: {e}");
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

/// Returns the route the stored media files are served under.
fn media_prefix(url_prefix: &str) -> String {
    let trimmed = url_prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        "/media".to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Creates the [`tracing::Span`] of the HTTP request being served.
fn request_span(r: &http::Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "HTTP request",
        http.client_ip = InsecureClientIp::from(r.headers(), r.extensions())
            .map(|ip| ip.0.to_string())
            .ok(),
        http.flavor = ?r.version(),
        http.host = r.uri().host(),
        http.method = r.method().as_str(),
        http.route = r
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str),
        http.scheme = r.uri().scheme().map(http::uri::Scheme::as_str),
        http.target = r
            .uri()
            .path_and_query()
            .map(http::uri::PathAndQuery::as_str),
        http.user_agent = r
            .headers()
            .get(http::header::USER_AGENT)
            .and_then(|h| h.to_str().ok()),
        http.status_code = tracing::field::Empty,
    )
}

/// Logs the served HTTP response in its request `span`.
///
/// Redirects are the normal outcome of submitted forms, so only failed
/// responses are logged above `INFO`.
fn log_response(
    r: &http::Response<Body>,
    dur: time::Duration,
    span: &tracing::Span,
) {
    _ = span.record(
        "http.status_code",
        tracing::field::display(r.status().as_u16()),
    );

    let duration = format!("{}ms", dur.as_millis());
    if r.status().is_server_error() {
        tracing::error!(duration);
    } else if r.status().is_client_error() {
        tracing::warn!(duration);
    } else {
        tracing::info!(duration);
    }
}
