//! Nitro HTTP Session Management
//!
//! Owns the HTTP transport and the session token for one appliance. Every value
//! (token, timeout, TLS policy) lives on the instance, so any number of
//! connections can run side by side without touching shared state.

use crate::error::{ExporterError, Result};
use crate::nitro::target::{ClientSettings, DeviceQuirks, DeviceTarget};
use crate::nitro::types::{LoginCredentials, LoginPayload, LogoutPayload, NitroEnvelope};
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const SESSION_COOKIE: &str = "NITRO_AUTH_TOKEN";
const LOGOUT_CONTENT_TYPE: &str = "application/vnd.com.citrix.netscaler.logout+json";
const MAX_ERROR_BODY: usize = 512;

/// Which half of the Nitro API a request addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKind {
    Stat,
    Config,
}

impl ApiKind {
    fn segment(self) -> &'static str {
        match self {
            ApiKind::Stat => "stat",
            ApiKind::Config => "config",
        }
    }
}

/// Server-issued session token.
#[derive(Clone)]
pub struct Session {
    token: SecretString,
}

impl Session {
    fn cookie(&self) -> String {
        format!("{}={}", SESSION_COOKIE, self.token.expose_secret())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Session([REDACTED])")
    }
}

/// HTTP connection to one appliance plus its (optional) session.
#[derive(Clone)]
pub struct NitroConnection {
    http: reqwest::Client,
    base: Url,
    instance: String,
    username: String,
    password: SecretString,
    quirks: DeviceQuirks,
    session: Arc<Mutex<Option<Session>>>,
}

impl NitroConnection {
    pub fn new(target: &DeviceTarget, settings: ClientSettings) -> Result<Self> {
        let base = Url::parse(&format!("{}/nitro/v1/", target.url()))
            .map_err(|e| ExporterError::InvalidTarget(format!("{}: {}", target.url(), e)))?;

        let mut builder = reqwest::Client::builder().timeout(settings.request_timeout);
        if target.ignore_cert {
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base,
            instance: target.instance().to_string(),
            username: target.username.clone(),
            password: target.password.clone(),
            quirks: settings.quirks,
            session: Arc::new(Mutex::new(None)),
        })
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub async fn has_session(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Builds `<base>/nitro/v1/<kind>/<resource>[/<object>][?query]`.
    fn endpoint(
        &self,
        kind: ApiKind,
        resource: &str,
        object: Option<&str>,
        query: &[(&str, &str)],
    ) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ExporterError::InvalidTarget(format!("{} cannot be a base URL", self.base))
            })?;
            segments.pop_if_empty().push(kind.segment()).push(resource);
            if let Some(object) = object {
                segments.push(object);
            }
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Logs in and stores the session on this connection.
    pub async fn login(&self) -> Result<()> {
        let url = self.endpoint(ApiKind::Config, "login", None, &[])?;
        let payload = LoginPayload {
            login: LoginCredentials {
                username: &self.username,
                password: self.password.expose_secret(),
            },
        };

        debug!(instance = %self.instance, "Sending login request");
        let response = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ExporterError::Auth {
                status: 0,
                message: format!("appliance unreachable: {}", e),
            })?;

        let status = response.status();
        let cookie_token = session_cookie(&response);
        let body = response.text().await.unwrap_or_default();
        let envelope = serde_json::from_str::<NitroEnvelope>(&body).ok();

        if !self.quirks.is_login_success(status.as_u16()) {
            let message = envelope
                .map(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| truncate(&body));
            return Err(ExporterError::Auth {
                status: status.as_u16(),
                message,
            });
        }

        let envelope = envelope.unwrap_or_default();
        if !envelope.is_success() {
            return Err(ExporterError::Auth {
                status: status.as_u16(),
                message: format!("errorcode {}: {}", envelope.errorcode, envelope.message),
            });
        }

        let token = cookie_token
            .or(envelope.sessionid)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ExporterError::Auth {
                status: status.as_u16(),
                message: "login succeeded but no session token was issued".to_string(),
            })?;

        *self.session.lock().await = Some(Session {
            token: SecretString::from(token),
        });
        info!(instance = %self.instance, "Nitro session opened");
        Ok(())
    }

    /// Logs out. The session is taken first, so a session is logged out at
    /// most once no matter how often this is called.
    pub async fn logout(&self) -> Result<()> {
        let Some(session) = self.session.lock().await.take() else {
            debug!(instance = %self.instance, "No open session, skipping logout");
            return Ok(());
        };

        let url = self.endpoint(ApiKind::Config, "logout", None, &[])?;
        let body = serde_json::to_string(&LogoutPayload::default())?;

        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, LOGOUT_CONTENT_TYPE)
            .header(COOKIE, session.cookie())
            .body(body)
            .send()
            .await
            .map_err(|e| ExporterError::Logout {
                status: 0,
                message: e.to_string(),
            })?;

        let status = response.status();
        if self.quirks.is_logout_success(status.as_u16()) {
            info!(instance = %self.instance, "Nitro session closed");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ExporterError::Logout {
            status: status.as_u16(),
            message: truncate(&body),
        })
    }

    /// GETs one stat or config resource and validates the envelope.
    pub async fn get(
        &self,
        kind: ApiKind,
        resource: &str,
        object: Option<&str>,
        query: &[(&str, &str)],
    ) -> Result<NitroEnvelope> {
        let url = self.endpoint(kind, resource, object, query)?;
        let label = resource_label(kind, resource, object);

        let mut request = self.http.get(url).header(ACCEPT, "application/json");
        if let Some(session) = self.session.lock().await.as_ref() {
            request = request.header(COOKIE, session.cookie());
        }

        debug!(instance = %self.instance, resource = %label, "Sending request");
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope = if body.trim().is_empty() {
            None
        } else {
            serde_json::from_str::<NitroEnvelope>(&body).ok()
        };

        if let Some(envelope) = &envelope {
            if !envelope.is_success() {
                if self.quirks.tolerates(envelope.errorcode) && status.is_success() {
                    debug!(
                        instance = %self.instance,
                        resource = %label,
                        errorcode = envelope.errorcode,
                        "Tolerated Nitro error code: {}",
                        envelope.message
                    );
                } else {
                    return Err(ExporterError::Fetch {
                        resource: label,
                        errorcode: envelope.errorcode,
                        message: envelope.message.clone(),
                        severity: envelope.severity.clone(),
                    });
                }
            }
        }

        if !status.is_success() {
            return Err(ExporterError::FetchStatus {
                resource: label,
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        match envelope {
            Some(envelope) => Ok(envelope),
            None => match serde_json::from_str::<NitroEnvelope>(&body) {
                Ok(envelope) => Ok(envelope),
                Err(e) => {
                    warn!(instance = %self.instance, resource = %label, "Undecodable Nitro response");
                    Err(ExporterError::Json(e))
                }
            },
        }
    }
}

fn resource_label(kind: ApiKind, resource: &str, object: Option<&str>) -> String {
    match object {
        Some(object) => format!("{}/{}/{}", kind.segment(), resource, object),
        None => format!("{}/{}", kind.segment(), resource),
    }
}

fn session_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
}

fn truncate(body: &str) -> String {
    let body = body.trim();
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
