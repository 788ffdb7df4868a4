use bypass_relay::bot::handlers::{
    handle_callback, handle_message, report_failure, BotUsername,
};
use bypass_relay::bot::pagination::SessionStore;
use bypass_relay::config::{
    get_bulk_timeout, get_bypass_timeout, get_poster_timeout, get_result_cache_max_size,
    get_result_cache_ttl, get_session_cache_max_size, get_session_cache_ttl, Settings,
};
use bypass_relay::fetch::{
    BypassFetcher, HttpTransport, PosterFetcher, ReqwestTransport, ResultCache, RetryPolicy,
};
use bypass_relay::services::ServiceRegistry;
use dotenvy::dotenv;
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting bot tokens from log output
struct RedactionPatterns {
    token_url: Regex,
    token_bare: Regex,
    token_prefixed: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token_url: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
            token_bare: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            token_prefixed: Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let output = self
            .token_url
            .replace_all(input, "$1[TELEGRAM_TOKEN]$3");
        let output = self
            .token_bare
            .replace_all(&output, "[TELEGRAM_TOKEN]");
        self.token_prefixed
            .replace_all(&output, "$1[TELEGRAM_TOKEN]")
            .into_owned()
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // Report the original length; the redacted text may differ.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);

    init_logging(patterns);

    info!("Starting bypass relay bot...");

    let settings = init_settings();
    let registry = Arc::new(ServiceRegistry::from_settings(&settings));
    let http: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new());

    let bypass = init_bypass_fetcher(&registry, &http);
    let poster = init_poster_fetcher(&registry, &http);
    let sessions = init_session_store();

    let bot = Bot::new(settings.telegram_token.clone());
    let me = bot.get_me().await?;
    let username = Arc::new(BotUsername(me.username.clone().unwrap_or_default()));
    info!("Logged in as @{}", username.0);
    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![settings, bypass, poster, sessions, username])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            if s.gofile_api_url.is_none() {
                info!("GOFILE_API_URL not set; /gofile will report it as not configured.");
            }
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_bypass_fetcher(
    registry: &Arc<ServiceRegistry>,
    http: &Arc<dyn HttpTransport>,
) -> Arc<BypassFetcher> {
    let ttl = get_result_cache_ttl();
    let max_size = get_result_cache_max_size();
    info!("Initializing bypass result cache (ttl: {}s, max_size: {})", ttl, max_size);

    Arc::new(BypassFetcher::new(
        Arc::clone(registry),
        Arc::clone(http),
        ResultCache::new(Duration::from_secs(ttl), max_size),
        get_bypass_timeout(),
        get_bulk_timeout(),
    ))
}

fn init_poster_fetcher(
    registry: &Arc<ServiceRegistry>,
    http: &Arc<dyn HttpTransport>,
) -> Arc<PosterFetcher> {
    Arc::new(PosterFetcher::new(
        Arc::clone(registry),
        Arc::clone(http),
        ResultCache::new(
            Duration::from_secs(get_result_cache_ttl()),
            get_result_cache_max_size(),
        ),
        RetryPolicy::default(),
        get_poster_timeout(),
    ))
}

fn init_session_store() -> Arc<SessionStore> {
    let ttl = get_session_cache_ttl();
    let max_size = get_session_cache_max_size();
    info!("Initializing pagination sessions (ttl: {}s, max_size: {})", ttl, max_size);

    Arc::new(SessionStore::new(Duration::from_secs(ttl), max_size))
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_callback_query))
        .branch(Update::filter_message().endpoint(handle_command_message))
}

async fn handle_command_message(
    bot: Bot,
    msg: Message,
    settings: Arc<Settings>,
    bypass: Arc<BypassFetcher>,
    poster: Arc<PosterFetcher>,
    sessions: Arc<SessionStore>,
    username: Arc<BotUsername>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) =
        handle_message(bot.clone(), msg.clone(), settings, bypass, poster, sessions, username).await
    {
        error!("Command handler error: {}", e);
        report_failure(&bot, &msg).await;
    }
    respond(())
}

async fn handle_callback_query(
    bot: Bot,
    q: CallbackQuery,
    settings: Arc<Settings>,
    sessions: Arc<SessionStore>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handle_callback(bot, q, settings, sessions).await {
        error!("Callback handler error: {}", e);
    }
    respond(())
}
