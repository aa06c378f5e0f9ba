// Session login/logout and platform detection.
//
// Login drops a session cookie into the client's jar. UniFi OS also hands
// out a CSRF token that must accompany every write.

use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::auth::ControllerPlatform;
use crate::error::Error;
use crate::legacy::client::LegacyClient;
use crate::transport::TransportConfig;

impl LegacyClient {
    /// Open a session with username/password.
    ///
    /// `POST /api/auth/login` on UniFi OS, `POST /api/login` on a classic
    /// controller.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.base_url().join(self.platform().login_path())?;
        debug!(%url, username, "opening session");

        let resp = self
            .http()
            .post(url)
            .json(&json!({
                "username": username,
                "password": password.expose_secret(),
                "remember": false,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login rejected (HTTP {status}): {detail}"),
            });
        }

        if let Some(token) = csrf_token(&resp) {
            self.set_csrf_token(token);
        }
        debug!(platform = ?self.platform(), "session open");
        Ok(())
    }

    /// Close the session. Failures are reported but harmless.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.base_url().join(self.platform().logout_path())?;
        debug!(%url, "closing session");
        self.http().post(url).send().await?;
        Ok(())
    }

    /// Work out which login route the controller serves.
    ///
    /// Anything but 404 on `/api/auth/login` (401 and 405 included) means
    /// UniFi OS; otherwise the classic route must at least be reachable.
    pub async fn detect_platform(
        base_url: &Url,
        transport: &TransportConfig,
    ) -> Result<ControllerPlatform, Error> {
        let http = transport.build_client()?;

        for platform in [ControllerPlatform::UnifiOs, ControllerPlatform::ClassicController] {
            let probe = base_url.join(platform.login_path())?;
            debug!(%probe, "probing login route");
            match http.get(probe).send().await {
                Ok(resp) if resp.status() != StatusCode::NOT_FOUND => return Ok(platform),
                Ok(_) => {}
                // The classic probe is the last chance; surface why it failed.
                Err(e) if platform == ControllerPlatform::ClassicController => return Err(e.into()),
                Err(_) => {}
            }
        }
        // Classic controllers without a GET handler on /api/login still work.
        Ok(ControllerPlatform::ClassicController)
    }
}

fn csrf_token(resp: &Response) -> Option<String> {
    resp.headers()
        .get("x-csrf-token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}
