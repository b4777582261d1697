use log::{debug, warn};
use once_cell::sync::OnceCell;
use reqwest::{Client, RequestBuilder, Response, Url, header::RETRY_AFTER, multipart::Form};
use serde::Serialize;
use std::{env, fmt, time::Duration};

use crate::{
    endpoints::{Answer, credits::Credits, parse_answer},
    engine::Engine,
    error::{Result, TextSynthError},
};

/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "api.textsynth.com";
/// Environment variable holding the API secret key.
pub const SECRET_KEY_ENV: &str = "TEXTSYNTH_SECRET_KEY";

static DEFAULT_CLIENT: OnceCell<TextSynthClient> = OnceCell::new();

/// A client for the TextSynth API.
///
/// Holds the resolved base URL, the secret key and a pooled
/// `reqwest::Client`. Cloning is cheap and clones share the connection pool,
/// so a single client can serve any number of engines and tasks.
#[derive(Clone)]
pub struct TextSynthClient {
    http: Client,
    base_url: String,
    secret_key: String,
}

/// Builder for [`TextSynthClient`].
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use textsynth::TextSynthClient;
///
/// let client = TextSynthClient::builder()
///     .host("api.textsynth.com")
///     .secret_key("my-key")
///     .timeout(Duration::from_secs(120))
///     .build()?;
/// # Ok::<(), textsynth::TextSynthError>(())
/// ```
#[derive(Default, Clone)]
pub struct ClientBuilder {
    host: Option<String>,
    secret_key: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API host. A bare host name is served over HTTPS; a value
    /// containing a scheme (`http://localhost:8080`) is used as-is.
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the secret key. When unset, `TEXTSYNTH_SECRET_KEY` is read at build time.
    pub fn secret_key<S: Into<String>>(mut self, secret_key: S) -> Self {
        self.secret_key = Some(secret_key.into());
        self
    }

    /// Total time allowed for a request, from connection to the end of the body.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = Some(connect_timeout);
        self
    }

    /// Uses an existing HTTP client. Timeouts set on this builder are then
    /// ignored, the given client's own settings apply.
    pub fn http_client(mut self, http_client: Client) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    /// Returns `TextSynthError::Configuration` if no secret key is available
    /// or the HTTP client cannot be created.
    pub fn build(self) -> Result<TextSynthClient> {
        let secret_key = resolve_secret_key(self.secret_key, |name| env::var(name).ok())?;
        let base_url = base_url(self.host.as_deref().unwrap_or(DEFAULT_HOST))?;
        let http = match self.http_client {
            Some(http) => http,
            None => {
                let mut builder = Client::builder()
                    .user_agent(concat!("textsynth-rs/", env!("CARGO_PKG_VERSION")));
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                if let Some(connect_timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(connect_timeout);
                }
                builder.build()?
            }
        };
        debug!("Created TextSynth client for {base_url}");
        Ok(TextSynthClient {
            http,
            base_url,
            secret_key,
        })
    }
}

/// Picks the explicit key if given, otherwise looks up `TEXTSYNTH_SECRET_KEY`.
pub(crate) fn resolve_secret_key<F>(explicit: Option<String>, lookup: F) -> Result<String>
where
    F: FnOnce(&str) -> Option<String>,
{
    let key = explicit.or_else(|| lookup(SECRET_KEY_ENV)).unwrap_or_default();
    if key.trim().is_empty() {
        return Err(TextSynthError::Configuration(format!(
            "no secret key given and {SECRET_KEY_ENV} is not set"
        )));
    }
    Ok(key)
}

/// Turns a host setting into a base URL without trailing slash.
pub(crate) fn base_url(host: &str) -> Result<String> {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(TextSynthError::Configuration("host must not be empty".to_string()));
    }
    let base_url = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };
    let parsed = Url::parse(&base_url)
        .map_err(|e| TextSynthError::Configuration(format!("invalid host '{host}': {e}")))?;
    if parsed.host_str().is_none() {
        return Err(TextSynthError::Configuration(format!(
            "invalid host '{host}': no host name"
        )));
    }
    Ok(base_url)
}

impl TextSynthClient {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client for `host` with an explicit secret key.
    pub fn new<H: Into<String>, K: Into<String>>(host: H, secret_key: K) -> Result<Self> {
        Self::builder().host(host).secret_key(secret_key).build()
    }

    /// Creates a client from the environment: default host and `TEXTSYNTH_SECRET_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::builder().build()
    }

    /// Base URL requests are sent to, e.g. `https://api.textsynth.com`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns a handle on one engine. No request is made.
    ///
    /// # Errors
    /// Returns `TextSynthError::Validation` if `engine_id` is empty.
    pub fn engine<S: Into<String>>(&self, engine_id: S) -> Result<Engine> {
        Engine::new(self.clone(), engine_id.into())
    }

    /// Returns the credits left on the account.
    pub async fn credits(&self) -> Result<Credits> {
        self.get("credits").await
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path)
    }

    pub(crate) async fn get<T: Answer>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!("GET {url}");
        let response = self.execute(self.http.get(&url)).await?;
        read_answer(response).await
    }

    pub(crate) async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: Answer,
        B: Serialize + ?Sized,
    {
        let response = self.post_json_raw(path, body).await?;
        read_answer(response).await
    }

    /// Sends a JSON request and hands back the response without reading its body.
    pub(crate) async fn post_json_raw<B>(&self, path: &str, body: &B) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!("POST {url}");
        self.execute(self.http.post(&url).json(body)).await
    }

    pub(crate) async fn post_multipart<T: Answer>(&self, path: &str, form: Form) -> Result<T> {
        let url = self.url(path);
        debug!("POST {url} (multipart)");
        let response = self.execute(self.http.post(&url).multipart(form)).await?;
        read_answer(response).await
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.bearer_auth(&self.secret_key).send().await?;
        check_status(response).await
    }
}

impl fmt::Debug for TextSynthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextSynthClient")
            .field("base_url", &self.base_url)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());
    let url = response.url().to_string();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!("{url} failed with {status}, and its body could not be read: {e}");
            format!("{status} (error body unreadable: {e})")
        }
    };
    let err = TextSynthError::from_status(status, retry_after, &body);
    warn!("{url} failed with {status}: {err}");
    Err(err)
}

async fn read_answer<T: Answer>(response: Response) -> Result<T> {
    let body = response.bytes().await?;
    parse_answer(&body)
}

/// Returns the process-wide client, creating it from the environment on first use.
///
/// # Errors
/// Returns `TextSynthError::Configuration` if `TEXTSYNTH_SECRET_KEY` is not
/// set and no client was installed with [`set_default_client`]. A failed
/// attempt is not cached.
pub fn default_client() -> Result<&'static TextSynthClient> {
    DEFAULT_CLIENT.get_or_try_init(TextSynthClient::from_env)
}

/// Installs `client` as the process-wide client.
///
/// # Errors
/// Returns `TextSynthError::Configuration` if a default client already exists.
pub fn set_default_client(client: TextSynthClient) -> Result<()> {
    DEFAULT_CLIENT.set(client).map_err(|_| {
        TextSynthError::Configuration("a default client is already installed".to_string())
    })
}

/// Returns a handle on `engine_id` through the default client.
pub fn engine<S: Into<String>>(engine_id: S) -> Result<Engine> {
    default_client()?.engine(engine_id)
}
