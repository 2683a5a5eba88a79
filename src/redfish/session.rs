//! HTTPS Redfish session client.
//! Opens a token session through the SessionService and authenticates every GET with
//! `X-Auth-Token`; falls back to basic auth when the BMC refuses to create a session.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::LOCATION, StatusCode};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use super::{FetchError, SessionClient};
use crate::config::types::{HostConfig, RedfishSettings};

const SESSIONS_PATH: &str = "/redfish/v1/SessionService/Sessions";
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

#[derive(Serialize)]
struct SessionRequest<'a> {
    #[serde(rename = "UserName")]
    username: &'a str,
    #[serde(rename = "Password")]
    password: &'a str,
}

#[derive(Debug, Clone)]
struct ActiveSession {
    token: String,
    /// Absolute URL of the session resource, used for DELETE on teardown
    location: Option<String>,
}

pub struct RedfishSession {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    active: RwLock<Option<ActiveSession>>,
}

impl RedfishSession {
    /// Build a client for `target` (host or host:port) with the host's credentials.
    pub fn new(target: &str, host: &HostConfig, settings: &RedfishSettings) -> Result<Self, FetchError> {
        let base_url = format!("{}://{}", host.scheme, target.trim_end_matches('/'));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs_f64(settings.timeout_secs))
            .danger_accept_invalid_certs(!settings.verify_tls)
            .build()
            .map_err(|e| FetchError::Transport {
                path: base_url.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url,
            username: host.username.clone(),
            password: host.password.clone(),
            active: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a path or absolute URL against the BMC base URL.
    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    fn transport_error(path: &str, err: reqwest::Error) -> FetchError {
        FetchError::Transport {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl SessionClient for RedfishSession {
    async fn create_session(&self) -> Result<(), FetchError> {
        let body = SessionRequest {
            username: &self.username,
            password: &self.password,
        };

        let response = self
            .http
            .post(self.url(SESSIONS_PATH))
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::transport_error(SESSIONS_PATH, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                path: SESSIONS_PATH.to_string(),
                status: status.as_u16(),
            });
        }

        let headers = response.headers();
        let token = headers
            .get(AUTH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| FetchError::Transport {
                path: SESSIONS_PATH.to_string(),
                message: format!("session response carried no {} header", AUTH_TOKEN_HEADER),
            })?;
        let location = headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|l| self.url(l));

        debug!("Redfish session opened on {} ({:?})", self.base_url, location);
        *self.active.write().await = Some(ActiveSession { token, location });
        Ok(())
    }

    async fn delete_session(&self) -> Result<(), FetchError> {
        let Some(session) = self.active.write().await.take() else {
            return Ok(());
        };
        let Some(location) = session.location else {
            return Ok(());
        };

        let response = self
            .http
            .delete(&location)
            .header(AUTH_TOKEN_HEADER, &session.token)
            .send()
            .await
            .map_err(|e| Self::transport_error(&location, e))?;

        let status = response.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(FetchError::Status {
                path: location,
                status: status.as_u16(),
            });
        }

        debug!("Redfish session closed on {}", self.base_url);
        Ok(())
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value, FetchError> {
        let mut request = self.http.get(self.url(path));
        request = match self.active.read().await.as_ref() {
            Some(session) => request.header(AUTH_TOKEN_HEADER, &session.token),
            None => request.basic_auth(&self.username, Some(&self.password)),
        };

        trace!("GET {}{}", self.base_url, path);
        let response = request
            .send()
            .await
            .map_err(|e| Self::transport_error(path, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(FetchError::NotFound(path.to_string())),
            status if !status.is_success() => {
                return Err(FetchError::Status {
                    path: path.to_string(),
                    status: status.as_u16(),
                })
            }
            _ => {}
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Self::transport_error(path, e))?;

        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(target: &str) -> RedfishSession {
        let host = HostConfig {
            scheme: "https".to_string(),
            username: "root".to_string(),
            password: "calvin".to_string(),
        };
        RedfishSession::new(target, &host, &RedfishSettings::default()).unwrap()
    }

    #[test]
    fn joins_paths_onto_base_url() {
        let client = session("10.0.0.5:8443");
        assert_eq!(client.base_url(), "https://10.0.0.5:8443");
        assert_eq!(
            client.url("/redfish/v1/Systems"),
            "https://10.0.0.5:8443/redfish/v1/Systems"
        );
        assert_eq!(client.url("redfish/v1"), "https://10.0.0.5:8443/redfish/v1");
    }

    #[test]
    fn keeps_absolute_locations() {
        let client = session("bmc.example");
        assert_eq!(
            client.url("https://bmc.example/redfish/v1/SessionService/Sessions/7"),
            "https://bmc.example/redfish/v1/SessionService/Sessions/7"
        );
    }

    #[tokio::test]
    async fn delete_without_session_is_a_no_op() {
        let client = session("bmc.example");
        assert!(client.delete_session().await.is_ok());
    }
}
