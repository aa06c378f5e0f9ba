// Legacy API device endpoints
//
// Reads via stat/device, configuration writes via rest/device, and
// lifecycle commands via cmd/devmgr (adopt) and cmd/sitemgr (forget).

use serde_json::json;
use tracing::debug;

use crate::error::Error;
use crate::legacy::client::LegacyClient;
use crate::legacy::models::LegacyDevice;

impl LegacyClient {
    /// List all devices known to the site, adopted or pending.
    ///
    /// `GET /api/s/{site}/stat/device`
    pub async fn list_devices(&self, site: &str) -> Result<Vec<LegacyDevice>, Error> {
        let url = self.site_url(site, "stat/device")?;
        debug!(site, "listing devices");
        self.get(url, "devices").await
    }

    /// Fetch a single device by MAC address.
    ///
    /// `GET /api/s/{site}/stat/device/{mac}`. An empty result is
    /// reported as [`Error::NotFound`].
    pub async fn get_device_by_mac(&self, site: &str, mac: &str) -> Result<LegacyDevice, Error> {
        let mac = mac.to_lowercase();
        let url = self.site_url(site, &format!("stat/device/{mac}"))?;
        debug!(site, mac, "fetching device by MAC");
        first_or_not_found(self.get(url, &mac).await?, &mac)
    }

    /// Fetch a single device by its controller id.
    ///
    /// The stat endpoint only addresses devices by MAC, so this lists
    /// `stat/device` and filters on `_id`.
    pub async fn get_device(&self, site: &str, id: &str) -> Result<LegacyDevice, Error> {
        debug!(site, id, "fetching device by id");
        let devices = self.list_devices(site).await?;
        first_or_not_found(devices.into_iter().filter(|d| d.id == id).collect(), id)
    }

    /// Write device configuration.
    ///
    /// `PUT /api/s/{site}/rest/device/{id}` with the full device record;
    /// the controller echoes back the stored record.
    pub async fn update_device(
        &self,
        site: &str,
        device: &LegacyDevice,
    ) -> Result<LegacyDevice, Error> {
        let url = self.site_url(site, &format!("rest/device/{}", device.id))?;
        debug!(site, id = %device.id, mac = %device.mac, "updating device");
        first_or_not_found(self.put(url, device, &device.id).await?, &device.id)
    }

    /// Adopt a pending device.
    ///
    /// `POST /api/s/{site}/cmd/devmgr` with `{"cmd": "adopt", "mac": "..."}`
    pub async fn adopt_device(&self, site: &str, mac: &str) -> Result<(), Error> {
        let url = self.site_url(site, "cmd/devmgr")?;
        debug!(site, mac, "adopting device");
        let _: Vec<serde_json::Value> = self
            .post(
                url,
                &json!({
                    "cmd": "adopt",
                    "mac": mac.to_lowercase(),
                }),
                mac,
            )
            .await?;
        Ok(())
    }

    /// Forget (un-adopt) a device, returning it to the pending pool.
    ///
    /// `POST /api/s/{site}/cmd/sitemgr` with `{"cmd": "delete-device", "macs": ["..."]}`
    pub async fn forget_device(&self, site: &str, mac: &str) -> Result<(), Error> {
        let url = self.site_url(site, "cmd/sitemgr")?;
        debug!(site, mac, "forgetting device");
        let _: Vec<serde_json::Value> = self
            .post(
                url,
                &json!({
                    "cmd": "delete-device",
                    "macs": [mac.to_lowercase()],
                }),
                mac,
            )
            .await?;
        Ok(())
    }
}

pub(crate) fn first_or_not_found<T>(items: Vec<T>, subject: &str) -> Result<T, Error> {
    items.into_iter().next().ok_or_else(|| Error::NotFound {
        resource: subject.to_owned(),
    })
}
