use std::{fs::OpenOptions, net::SocketAddr, process::ExitCode, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use pesatrack_rs::{
    AppState, GateConfig, IdentityProviderConfig, build_router, graceful_shutdown,
    logging_middleware, request_timeout_for_lookup,
};

/// The web server for PesaTrack.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The port to serve the app from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Path prefixes that require a signed in user.
    #[arg(
        long,
        env = "PROTECTED_PREFIXES",
        value_delimiter = ',',
        default_value = "/dashboard,/account,/transaction"
    )]
    protected_prefixes: Vec<String>,

    /// Path prefixes that signed in users are redirected away from.
    #[arg(
        long,
        env = "AUTH_ONLY_PREFIXES",
        value_delimiter = ',',
        default_value = "/sign-in,/sign-up"
    )]
    auth_only_prefixes: Vec<String>,

    /// The page visitors without a session are sent to.
    #[arg(long, env = "SIGN_IN_PATH", default_value = "/sign-in")]
    sign_in_path: String,

    /// The page signed in users land on by default.
    #[arg(long, env = "LANDING_PATH", default_value = "/dashboard")]
    landing_path: String,

    /// Base URL of the GoTrue-compatible identity provider.
    #[arg(long, env = "IDENTITY_PROVIDER_URL")]
    identity_provider_url: String,

    /// Public API key for the identity provider.
    #[arg(long, env = "IDENTITY_PROVIDER_KEY", hide_env_values = true)]
    identity_provider_key: String,

    /// Name of the cookie holding the access token.
    #[arg(long, env = "ACCESS_TOKEN_COOKIE", default_value = "sb-access-token")]
    access_token_cookie: String,

    /// Name of the cookie holding the refresh token.
    #[arg(long, env = "REFRESH_TOKEN_COOKIE", default_value = "sb-refresh-token")]
    refresh_token_cookie: String,

    /// How long to wait for the identity provider before treating a request
    /// as signed out, in milliseconds.
    #[arg(long, env = "SESSION_LOOKUP_TIMEOUT_MS", default_value_t = 5000)]
    session_lookup_timeout_ms: u64,

    /// File to write debug logs to.
    #[arg(long, env = "LOG_FILE", default_value = "debug.log")]
    log_file: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(error) = setup_logging(&args.log_file) {
        eprintln!("Could not set up logging: {error}");
        return ExitCode::FAILURE;
    }

    let lookup_timeout = Duration::from_millis(args.session_lookup_timeout_ms);
    let gate_config = GateConfig {
        protected_prefixes: args.protected_prefixes,
        auth_only_prefixes: args.auth_only_prefixes,
        sign_in_path: args.sign_in_path,
        default_landing_path: args.landing_path,
    };
    let provider_config = IdentityProviderConfig {
        access_token_cookie: args.access_token_cookie,
        refresh_token_cookie: args.refresh_token_cookie,
        request_timeout: request_timeout_for_lookup(lookup_timeout),
        ..IdentityProviderConfig::new(&args.identity_provider_url, &args.identity_provider_key)
    };

    let state = match AppState::new(gate_config, provider_config, lookup_timeout) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("Invalid configuration: {error}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Enforcing route policy {:?}", state.gate.policy());

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    tracing::info!("HTTP server listening on {}", addr);
    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server error: {error}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn setup_logging(log_file: &str) -> std::io::Result<()> {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new().create(true).append(true).open(log_file)?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
