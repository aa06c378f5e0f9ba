// ── User (known client) resource ──

use std::sync::Arc;

use tracing::{debug, info, warn};

use uniform_api::legacy::models::LegacyUser;

use crate::convert::{user_config_from_remote, user_to_remote};
use crate::diagnostics::Diagnostic;
use crate::directory::{ClientDirectory, DirectoryError};
use crate::error::CoreError;
use crate::model::{ImportId, ImportTarget, MacAddress, UserConfig, UserPlan, UserResourceState};
use crate::reconcile::Reconcile;

pub struct UserResource {
    directory: Arc<dyn ClientDirectory>,
    default_site: String,
}

fn user_error(operation: &str, subject: &str, err: DirectoryError) -> CoreError {
    match err {
        DirectoryError::NotFound { .. } => CoreError::NotFound {
            entity_type: "user".into(),
            identifier: subject.to_owned(),
        },
        DirectoryError::MacInUse { mac } => CoreError::MacConflict { mac },
        other => CoreError::Api {
            operation: operation.to_owned(),
            subject: subject.to_owned(),
            message: other.to_string(),
        },
    }
}

impl UserResource {
    pub fn new(directory: Arc<dyn ClientDirectory>, default_site: impl Into<String>) -> Self {
        Self {
            directory,
            default_site: default_site.into(),
        }
    }

    fn site<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.default_site)
    }

    pub fn validate(&self, plan: &UserPlan) -> Vec<Diagnostic> {
        plan.validate()
    }

    /// Register the client. A MAC that is already registered is absorbed
    /// into management when `allow_existing` is set.
    pub async fn create(&self, plan: &UserPlan) -> Result<UserResourceState, CoreError> {
        let site = self.site(plan.site.as_deref());
        let mac = plan.mac.as_str();

        let fresh = LegacyUser {
            mac: mac.to_owned(),
            ..LegacyUser::default()
        };
        let desired = user_to_remote(&fresh, &plan.config);

        let user = match self.directory.create_user(site, &desired).await {
            Ok(user) => user,
            Err(DirectoryError::MacInUse { .. }) if plan.allow_existing => {
                warn!(mac, site, "MAC already registered, taking over existing record");
                let existing = self
                    .directory
                    .get_user_by_mac(site, mac)
                    .await
                    .map_err(|e| user_error("create", mac, e))?;
                self.converge(site, &existing, &UserConfig::default(), &plan.config)
                    .await?
            }
            Err(err) => return Err(user_error("create", mac, err)),
        };

        info!(mac, site, "user under management");
        Self::state_from(&user, site, plan.allow_existing, plan.skip_forget_on_destroy)
    }

    pub async fn read(
        &self,
        prior: &UserResourceState,
    ) -> Result<Option<UserResourceState>, CoreError> {
        match self.directory.get_user(&prior.site, &prior.id).await {
            Ok(user) => Self::state_from(
                &user,
                &prior.site,
                prior.allow_existing,
                prior.skip_forget_on_destroy,
            )
            .map(Some),
            Err(DirectoryError::NotFound { .. }) => {
                debug!(id = %prior.id, "user no longer present");
                Ok(None)
            }
            Err(err) => Err(user_error("read", &prior.id, err)),
        }
    }

    pub async fn update(
        &self,
        prior: &UserResourceState,
        plan: &UserPlan,
    ) -> Result<UserResourceState, CoreError> {
        if plan.mac != prior.mac {
            return Err(CoreError::ImmutableField {
                field: "mac".into(),
                prior: prior.mac.to_string(),
                planned: plan.mac.to_string(),
            });
        }
        let site = self.site(plan.site.as_deref());
        if site != prior.site {
            return Err(CoreError::ImmutableField {
                field: "site".into(),
                prior: prior.site.clone(),
                planned: site.to_owned(),
            });
        }

        let snapshot = self
            .directory
            .get_user(site, &prior.id)
            .await
            .map_err(|e| user_error("update", &prior.id, e))?;
        let user = self
            .converge(site, &snapshot, &prior.config, &plan.config)
            .await?;
        Self::state_from(&user, site, plan.allow_existing, plan.skip_forget_on_destroy)
    }

    pub async fn delete(&self, prior: &UserResourceState) -> Result<(), CoreError> {
        if prior.skip_forget_on_destroy {
            info!(mac = %prior.mac, "skip_forget_on_destroy set, leaving user record");
            return Ok(());
        }
        match self
            .directory
            .delete_user_by_mac(&prior.site, prior.mac.as_str())
            .await
        {
            Ok(()) | Err(DirectoryError::NotFound { .. }) => Ok(()),
            Err(err) => Err(user_error("delete", prior.mac.as_str(), err)),
        }
    }

    pub async fn import(&self, raw: &str) -> Result<UserResourceState, CoreError> {
        let id = ImportId::parse(raw)?;
        let site = self.site(id.site.as_deref());

        let user = match &id.target {
            ImportTarget::Mac(mac) => self.directory.get_user_by_mac(site, mac.as_str()).await,
            ImportTarget::Id(user_id) => self.directory.get_user(site, user_id).await,
        }
        .map_err(|e| user_error("import", raw, e))?;

        info!(raw, mac = %user.mac, site, "imported user");
        Self::state_from(&user, site, true, false)
    }

    async fn converge(
        &self,
        site: &str,
        snapshot: &LegacyUser,
        prior: &UserConfig,
        plan: &UserConfig,
    ) -> Result<LegacyUser, CoreError> {
        let merged = UserConfig::reconcile(&user_config_from_remote(snapshot), prior, plan);
        let payload = user_to_remote(snapshot, &merged);
        if payload == *snapshot {
            debug!(mac = %snapshot.mac, "user already converged, skipping update");
            return Ok(snapshot.clone());
        }
        self.directory
            .update_user(site, &payload)
            .await
            .map_err(|e| user_error("update", &snapshot.mac, e))
    }

    fn state_from(
        user: &LegacyUser,
        site: &str,
        allow_existing: bool,
        skip_forget_on_destroy: bool,
    ) -> Result<UserResourceState, CoreError> {
        let id = user.id.clone().ok_or_else(|| {
            CoreError::Internal(format!("controller returned user {} without an id", user.mac))
        })?;
        Ok(UserResourceState {
            id,
            mac: MacAddress::parse(&user.mac)?,
            site: site.to_owned(),
            allow_existing,
            skip_forget_on_destroy,
            config: user_config_from_remote(user),
        })
    }
}
