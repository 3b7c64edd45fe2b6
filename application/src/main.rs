use std::{
    io,
    sync::{Arc, OnceLock},
    time,
};

use application::{api, graphql, report_csv, Args, Config};
use axum::{
    body::Body,
    extract::MatchedPath,
    routing::{get, on, MethodFilter},
    Extension, Router,
};
use axum_client_ip::InsecureClientIp;
use service::{
    infra::{postgres, Postgres},
    Service,
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    fmt::MakeWriter,
    layer::{Layer, SubscriberExt as _},
    registry::LookupSpan,
    util::SubscriberInitExt as _,
};

/// Levels written to `stderr` instead of `stdout`.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Maximum [`log::Level`] being written, once configured.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(output(io::stdout, false))
        .with(output(io::stderr, true))
        .init();

    _ = start().await;
}

/// Creates a compact log output, writing either the [`STDERR_LEVELS`] or the
/// rest of them up to the configured [`LOG_LEVEL`].
fn output<S, W>(writer: W, errors: bool) -> impl Layer<S>
where
    S: log::Subscriber + for<'s> LookupSpan<'s>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(true)
        .with_thread_names(true)
        .with_writer(writer)
        .with_filter(filter_fn(move |meta| {
            let max = LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO);
            meta.is_span()
                || (STDERR_LEVELS.contains(meta.level()) == errors
                    && max >= *meta.level())
        }))
}

async fn start() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        postgres,
        service,
        server,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let postgres = Postgres::new(&postgres.into()).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;
    postgres.migrate(migrations::runner()).await.map_err(|e| {
        log::error!("failed to run database migrations: {e}");
    })?;

    let config: service::Config = service.try_into().map_err(|e| {
        log::error!("invalid `service` configuration: {e}");
    })?;
    log::info!(
        currency = %config.currency,
        invoice_prefix = %config.numbering.invoice_prefix,
        quotation_prefix = %config.numbering.quotation_prefix,
        "numbering documents",
    );
    let service = Service::new(config, postgres);

    let schema = api::Schema::new(
        api::Query,
        api::Mutation,
        juniper::EmptySubscription::new(),
    );

    let app = Router::new()
        .route(
            "/graphql",
            on(MethodFilter::GET.or(MethodFilter::POST), graphql),
        )
        .route("/reports/:file", get(report_csv))
        .layer(Extension(Arc::new(schema)))
        .layer(Extension(service))
        .layer(cors(&server.cors.origins)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_span)
                .on_response(on_response),
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
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                log::error!("failed to await shutdown signal: {e}");
            }
            log::info!("shutting down");
        })
        .await
        .map_err(|e| log::error!("webserver failed: {e}"))
}

/// Creates a [`CorsLayer`] allowing the provided `origins` to query the API
/// and download the CSV reports.
fn cors(origins: &[String]) -> Result<CorsLayer, ()> {
    let mut cors = CorsLayer::new()
        .allow_methods([
            http::Method::GET,
            http::Method::OPTIONS,
            http::Method::POST,
        ])
        .allow_headers([http::header::CONTENT_TYPE])
        .expose_headers([http::header::CONTENT_DISPOSITION]);
    for origin in origins {
        cors = cors.allow_origin(
            origin.parse::<http::header::HeaderValue>().map_err(|e| {
                log::error!("`{origin}` is not current CORS origin: {e}");
            })?,
        );
    }
    Ok(cors)
}

/// Creates a [`log::Span`] of the provided HTTP request.
fn make_span(r: &http::Request<Body>) -> log::Span {
    log::info_span!(
        "HTTP request",
        http.client_ip = InsecureClientIp::from(r.headers(), r.extensions())
            .map(|ip| ip.0.to_string())
            .ok(),
        http.flavor = ?r.version(),
        http.method = r.method().as_str(),
        http.route = r
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str),
        http.target = r
            .uri()
            .path_and_query()
            .map(http::uri::PathAndQuery::as_str),
        http.user_agent = r
            .headers()
            .get("User-Agent")
            .and_then(|h| h.to_str().ok()),
        http.status_code = log::field::Empty,
    )
}

/// Records the status of the provided HTTP response into its [`log::Span`],
/// logging failed requests at the higher levels.
fn on_response(
    r: &http::Response<Body>,
    dur: time::Duration,
    span: &log::Span,
) {
    span.record(
        "http.status_code",
        log::field::display(r.status().as_u16()),
    );

    let duration = format!("{}ms", dur.as_millis());
    if r.status().is_server_error() {
        log::error!(duration = %duration);
    } else if r.status().is_client_error() {
        log::warn!(duration = %duration);
    } else {
        log::info!(duration = %duration);
    }
}
