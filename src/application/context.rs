use super::event::Caller;
use super::intents::IntentBook;
use crate::domain::ids::IdGenerator;
use crate::domain::ports::LedgerStoreBox;
use crate::domain::settings::{Feature, Settings};
use crate::domain::user::User;
use crate::error::{WorkflowError, WorkflowResult};
use std::collections::BTreeSet;
use std::time::Duration;

/// Deployment parameters the workflows depend on.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub admin_ids: BTreeSet<String>,
    pub admin_group_id: i64,
    pub intent_ttl: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            admin_ids: BTreeSet::new(),
            admin_group_id: 0,
            intent_ttl: Duration::from_secs(30 * 60),
        }
    }
}

/// Shared dependencies of every workflow, built once at startup.
pub struct WorkflowContext {
    pub store: LedgerStoreBox,
    pub config: WorkflowConfig,
    pub ids: IdGenerator,
    pub intents: IntentBook,
}

impl WorkflowContext {
    pub fn new(store: LedgerStoreBox, config: WorkflowConfig) -> Self {
        let intents = IntentBook::new(config.intent_ttl);
        Self {
            store,
            config,
            ids: IdGenerator::new(),
            intents,
        }
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.config.admin_ids.contains(user_id)
    }

    pub fn require_admin(&self, caller: &Caller) -> WorkflowResult<()> {
        if self.is_admin(&caller.user_id) {
            Ok(())
        } else {
            Err(WorkflowError::NotAdmin)
        }
    }

    pub async fn is_authorized(&self, user_id: &str) -> WorkflowResult<bool> {
        if self.is_admin(user_id) {
            return Ok(true);
        }
        Ok(self.store.load_authorized_users().await?.contains(user_id))
    }

    pub async fn require_authorized(&self, caller: &Caller) -> WorkflowResult<()> {
        if self.is_authorized(&caller.user_id).await? {
            Ok(())
        } else {
            Err(WorkflowError::NotAuthorized)
        }
    }

    /// Loads settings and checks that `general` and every listed feature are
    /// open.
    pub async fn require_open(&self, features: &[Feature]) -> WorkflowResult<Settings> {
        let settings = self.store.load_settings().await?;
        for feature in std::iter::once(Feature::General).chain(features.iter().copied()) {
            if !settings.maintenance.is_enabled(feature) {
                return Err(WorkflowError::MaintenanceActive(feature));
            }
        }
        Ok(settings)
    }

    /// The caller's record. Admins and authorized users who never ran
    /// `/start` get one created on the fly.
    pub async fn load_user(&self, caller: &Caller) -> WorkflowResult<User> {
        if let Some(user) = self.store.get_user(&caller.user_id).await? {
            return Ok(user);
        }
        let user = User::new(&caller.user_id, &caller.name, &caller.username, None);
        self.store.create_user(user).await?;
        self.store
            .get_user(&caller.user_id)
            .await?
            .ok_or_else(|| WorkflowError::Inconsistent(format!("user {} vanished", caller.user_id)))
    }

    /// Rejects callers with a top-up in either phase.
    pub async fn require_no_pending_topup(&self, user: &User) -> WorkflowResult<()> {
        if user.pending_topup().is_some() || self.intents.contains(&user.user_id).await {
            return Err(WorkflowError::PendingTopup);
        }
        Ok(())
    }
}
