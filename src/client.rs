//! Rapidgator HTTP client: login, dedup probe, transfer and link lookup.

use std::fmt;
use tracing::{debug, info};
use url::Url;

use crate::api::{
    self, DuploadInfoResponse, DuploadResponse, LoginResponse, PendingUpload, PreparedUpload,
};
use crate::multipart::MultipartForm;
use crate::{Cause, ContentDescriptor, Error, Result, Upload};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "http://rapidgator.net/";

/// Environment variable holding the account login.
pub const LOGIN_ENV: &str = "RAPIDGATOR_LOGIN";
/// Environment variable holding the account password.
pub const PASSWORD_ENV: &str = "RAPIDGATOR_PASSWORD";

/// Account login and password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    login: String,
    password: String,
}

impl Credentials {
    /// Create credentials, rejecting an empty login or password.
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let login = login.into();
        let password = password.into();
        if login.is_empty() {
            return Err(Error::Validation("login is empty".into()));
        }
        if password.is_empty() {
            return Err(Error::Validation("password is empty".into()));
        }
        Ok(Credentials { login, password })
    }

    /// Read credentials from `RAPIDGATOR_LOGIN` and `RAPIDGATOR_PASSWORD`.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| {
            std::env::var(name).map_err(|e| Error::Validation(format!("{}: {}", name, e)))
        };
        Credentials::new(var(LOGIN_ENV)?, var(PASSWORD_ENV)?)
    }

    pub fn login(&self) -> &str {
        &self.login
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opaque session token returned by login. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionId(<redacted>)")
    }
}

/// Client for uploading files to Rapidgator.
///
/// Bound to one account. Call [`authenticate`](Client::authenticate) once,
/// then [`upload`](Client::upload) as often as needed. Uploads only borrow
/// the client, so several can run from different threads at once; logging
/// in again needs exclusive access and therefore cannot race with them.
#[derive(Clone)]
pub struct Client {
    credentials: Credentials,
    base_url: Url,
    agent: ureq::Agent,
    default_folder: Option<u64>,
    session: Option<SessionId>,
}

impl Client {
    /// Create an unauthenticated client against the public service.
    pub fn new(credentials: Credentials) -> Self {
        Client {
            credentials,
            base_url: Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid URL"),
            agent: ureq::Agent::new(),
            default_folder: None,
            session: None,
        }
    }

    /// Create a client and log in straight away.
    pub fn login(credentials: Credentials) -> Result<Self> {
        let mut client = Client::new(credentials);
        client.authenticate()?;
        Ok(client)
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, mut base_url: Url) -> Self {
        // Endpoints are joined onto the root, which needs a trailing slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        self.base_url = base_url;
        self
    }

    /// Use a preconfigured HTTP agent (timeouts, proxy, TLS).
    pub fn with_agent(mut self, agent: ureq::Agent) -> Self {
        self.agent = agent;
        self
    }

    /// Folder uploads go into unless the upload names its own.
    pub fn with_default_folder(mut self, folder_id: u64) -> Self {
        self.default_folder = Some(folder_id);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// The active session, if logged in.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    /// Log in and store the returned session id, replacing any previous one.
    ///
    /// On failure the previous session is left untouched.
    pub fn authenticate(&mut self) -> Result<&SessionId> {
        let url = self.endpoint(api::LOGIN_PATH).map_err(Error::Auth)?;
        debug!(url = %url, login = %self.credentials.login, "logging in");

        let session_id = self
            .get_json::<LoginResponse>(
                self.agent
                    .get(url.as_str())
                    .query("username", &self.credentials.login)
                    .query("password", &self.credentials.password),
            )
            .and_then(LoginResponse::session_id)
            .map_err(Error::Auth)?;

        info!(login = %self.credentials.login, "authenticated");
        Ok(&*self.session.insert(SessionId(session_id)))
    }

    /// Upload a file and return its public download link.
    ///
    /// Content the service already holds is not transferred again.
    pub fn upload(&self, upload: Upload) -> Result<String> {
        if upload.name().is_empty() {
            return Err(Error::Validation("upload name is empty".into()));
        }
        let session = self.require_session()?;

        let (name, source, folder_id) = upload.into_parts();
        let folder_id = folder_id.or(self.default_folder);
        let descriptor = ContentDescriptor::describe(name, source)
            .map_err(|e| Error::Prepare(Cause::Io(e)))?;

        let pending = match self.prepare_with(session, &descriptor, folder_id)? {
            PreparedUpload::AlreadyExists { url } => {
                info!(name = %descriptor.name(), hash = %descriptor.hash(), "already on server, skipping transfer");
                return Ok(url);
            }
            PreparedUpload::Pending(pending) => pending,
        };

        self.transfer(&pending, &descriptor)?;
        let url = self.resolve_with(session, pending.upload_id())?;

        info!(name = %descriptor.name(), size = descriptor.size(), "upload complete");
        Ok(url)
    }

    /// Ask the service whether it already has this content.
    ///
    /// Sends the content hash and size; `folder_id` is omitted when `None`.
    pub fn prepare(
        &self,
        descriptor: &ContentDescriptor,
        folder_id: Option<u64>,
    ) -> Result<PreparedUpload> {
        self.prepare_with(self.require_session()?, descriptor, folder_id)
    }

    /// Post the content as a multipart form to a pending upload's URL.
    pub fn transfer(&self, pending: &PendingUpload, descriptor: &ContentDescriptor) -> Result<()> {
        let form = MultipartForm::new(descriptor.name(), descriptor.size());
        let content_length = form.content_length();
        debug!(
            upload_id = %pending.upload_id(),
            size = descriptor.size(),
            content_length,
            "transferring"
        );

        let file = descriptor
            .open()
            .map_err(|e| Error::Transfer(Cause::Io(e)))?;

        self.agent
            .post(pending.upload_url().as_str())
            .set("Content-Type", &form.content_type())
            .set("Content-Length", &content_length.to_string())
            .send(form.into_reader(file))
            .map_err(|e| Error::Transfer(e.into()))?;

        Ok(())
    }

    /// Look up the public link of a transferred upload.
    ///
    /// Can be retried with the same upload id if a previous attempt failed
    /// after the bytes were already delivered.
    pub fn resolve(&self, upload_id: &str) -> Result<String> {
        if upload_id.is_empty() {
            return Err(Error::Validation("upload id is empty".into()));
        }
        self.resolve_with(self.require_session()?, upload_id)
    }

    fn prepare_with(
        &self,
        session: &SessionId,
        descriptor: &ContentDescriptor,
        folder_id: Option<u64>,
    ) -> Result<PreparedUpload> {
        let url = self.endpoint(api::DUPLOAD_PATH).map_err(Error::Prepare)?;
        debug!(
            name = %descriptor.name(),
            size = descriptor.size(),
            hash = %descriptor.hash(),
            folder_id,
            "probing for existing upload"
        );

        let mut req = self
            .agent
            .get(url.as_str())
            .query("sid", session.as_str())
            .query("hash", &descriptor.hash().to_hex())
            .query("size", &descriptor.size().to_string())
            .query("name", descriptor.name());
        if let Some(folder_id) = folder_id {
            req = req.query("folder_id", &folder_id.to_string());
        }

        self.get_json::<DuploadResponse>(req)
            .and_then(DuploadResponse::into_prepared)
            .map_err(Error::Prepare)
    }

    fn resolve_with(&self, session: &SessionId, upload_id: &str) -> Result<String> {
        let url = self.endpoint(api::DUPLOAD_INFO_PATH).map_err(Error::Resolve)?;
        debug!(upload_id, "resolving upload");

        self.get_json::<DuploadInfoResponse>(
            self.agent
                .get(url.as_str())
                .query("sid", session.as_str())
                .query("uuid", upload_id),
        )
        .and_then(DuploadInfoResponse::link)
        .map_err(Error::Resolve)
    }

    fn require_session(&self) -> Result<&SessionId> {
        self.session
            .as_ref()
            .ok_or_else(|| Error::Validation("not authenticated; call authenticate() first".into()))
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, Cause> {
        self.base_url
            .join(path)
            .map_err(|e| Cause::Malformed(format!("endpoint {}: {}", path, e)))
    }

    fn get_json<T: for<'de> serde::Deserialize<'de>>(
        &self,
        req: ureq::Request,
    ) -> std::result::Result<T, Cause> {
        let body = req.call()?.into_string()?;
        api::parse(&body)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url.as_str())
            .field("default_folder", &self.default_folder)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
