// Legacy API user (known client) endpoints
//
// Known clients are created through group/user and edited through
// rest/user; stat/user/{mac} resolves a MAC to its record.

use serde_json::json;
use tracing::debug;

use crate::error::Error;
use crate::legacy::client::LegacyClient;
use crate::legacy::devices::first_or_not_found;
use crate::legacy::models::LegacyUser;

impl LegacyClient {
    /// Register a new known client.
    ///
    /// `POST /api/s/{site}/group/user` with `{"objects": [{"data": {...}}]}`.
    /// A MAC that is already registered fails with [`Error::MacInUse`].
    pub async fn create_user(&self, site: &str, user: &LegacyUser) -> Result<LegacyUser, Error> {
        let url = self.site_url(site, "group/user")?;
        debug!(site, mac = %user.mac, "creating user");

        // group/user nests each result as {"meta": {...}, "data": [user]}.
        let results: Vec<serde_json::Value> = self
            .post(url, &json!({ "objects": [{ "data": user }] }), &user.mac)
            .await?;
        let nested = first_or_not_found(results, &user.mac)?;

        if let Some(code) = nested.pointer("/meta/msg").and_then(|v| v.as_str()) {
            if nested.pointer("/meta/rc").and_then(|v| v.as_str()) != Some("ok") {
                return Err(Error::from_envelope_code(code, &user.mac));
            }
        }

        let created = nested
            .pointer("/data/0")
            .cloned()
            .ok_or_else(|| Error::NotFound {
                resource: user.mac.clone(),
            })?;
        serde_json::from_value(created).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: nested.to_string(),
        })
    }

    /// Fetch a known client by id.
    ///
    /// `GET /api/s/{site}/rest/user/{id}`
    pub async fn get_user(&self, site: &str, id: &str) -> Result<LegacyUser, Error> {
        let url = self.site_url(site, &format!("rest/user/{id}"))?;
        debug!(site, id, "fetching user");
        first_or_not_found(self.get(url, id).await?, id)
    }

    /// Fetch a known client by MAC.
    ///
    /// `GET /api/s/{site}/stat/user/{mac}`
    pub async fn get_user_by_mac(&self, site: &str, mac: &str) -> Result<LegacyUser, Error> {
        let mac = mac.to_lowercase();
        let url = self.site_url(site, &format!("stat/user/{mac}"))?;
        debug!(site, mac, "fetching user by MAC");
        first_or_not_found(self.get(url, &mac).await?, &mac)
    }

    /// Update a known client.
    ///
    /// `PUT /api/s/{site}/rest/user/{id}`
    pub async fn update_user(&self, site: &str, user: &LegacyUser) -> Result<LegacyUser, Error> {
        let id = user
            .id
            .as_deref()
            .ok_or(Error::UnsupportedOperation("update of a user without an id"))?;
        let url = self.site_url(site, &format!("rest/user/{id}"))?;
        debug!(site, id, mac = %user.mac, "updating user");
        first_or_not_found(self.put(url, user, id).await?, id)
    }

    /// Forget a known client.
    ///
    /// `POST /api/s/{site}/cmd/stamgr` with `{"cmd": "forget-sta", "macs": ["..."]}`
    pub async fn forget_user(&self, site: &str, mac: &str) -> Result<(), Error> {
        let url = self.site_url(site, "cmd/stamgr")?;
        debug!(site, mac, "forgetting user");
        let _: Vec<serde_json::Value> = self
            .post(
                url,
                &json!({
                    "cmd": "forget-sta",
                    "macs": [mac.to_lowercase()],
                }),
                mac,
            )
            .await?;
        Ok(())
    }
}
