//! Authenticated session state.
//!
//! [`SessionManager`] owns the current state, the two persistence tiers and
//! the auth service client. It is constructed by the application entry
//! point and lent to whatever needs it; lifecycle is
//! `new → restore → (verify_otp | logout)*`.

pub mod storage;
pub mod token;

use anyhow::Context;
use tracing::{info, warn};

pub use self::storage::{FileStorage, MemoryStorage, Storage, StorageTier};
pub use self::token::{UserIdentity, decode_identity, mask_token};
use crate::api::ApiClient;
use crate::api::auth::AuthClient;
use crate::config::{Config, paths};
use crate::error::AdminError;
use crate::registration::RegistrationRequest;

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "adminToken";
/// Storage key holding the serialized [`UserIdentity`].
pub const USER_KEY: &str = "adminUser";

/// Authentication state. `Authenticated` always carries both token and user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated { token: String, user: UserIdentity },
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }
}

/// Outcome of exchanging an OTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// No account exists for the phone; the caller should route to registration.
    AccountMissing,
    /// Session established for this identity.
    SignedIn(UserIdentity),
}

/// Login-form state for one OTP attempt. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOtpFlow {
    pub phone: String,
    pub otp_sent: bool,
}

impl PendingOtpFlow {
    pub fn new(phone: impl Into<String>) -> Self {
        Self {
            phone: phone.into().trim().to_string(),
            otp_sent: false,
        }
    }

    /// Sends (or re-sends) the OTP.
    ///
    /// # Errors
    /// `Validation` for an empty phone, otherwise as [`SessionManager::request_otp`].
    pub async fn send(&mut self, session: &SessionManager) -> Result<(), AdminError> {
        if self.phone.is_empty() {
            return Err(AdminError::validation("Phone number is required"));
        }
        session.request_otp(&self.phone).await?;
        self.otp_sent = true;
        Ok(())
    }

    /// Verifies `code` for this flow's phone.
    ///
    /// # Errors
    /// `Validation` when no OTP was sent or the code is empty, otherwise as
    /// [`SessionManager::verify_otp`].
    pub async fn verify(
        &self,
        session: &mut SessionManager,
        code: &str,
        remember: bool,
    ) -> Result<VerifyOutcome, AdminError> {
        if !self.otp_sent {
            return Err(AdminError::validation("Request an OTP before verifying"));
        }
        let code = code.trim();
        if code.is_empty() {
            return Err(AdminError::validation("OTP cannot be empty"));
        }
        session.verify_otp(&self.phone, code, remember).await
    }
}

/// Holds and persists authentication state.
pub struct SessionManager {
    state: SessionState,
    auth: AuthClient,
    long_lived: Box<dyn Storage>,
    session_scoped: Box<dyn Storage>,
}

impl SessionManager {
    pub fn new(
        auth: AuthClient,
        long_lived: Box<dyn Storage>,
        session_scoped: Box<dyn Storage>,
    ) -> Self {
        Self {
            state: SessionState::Unauthenticated,
            auth,
            long_lived,
            session_scoped,
        }
    }

    /// Builds a manager backed by the configured file stores.
    ///
    /// # Errors
    /// Returns a `Validation` error if the auth base URL is invalid.
    pub fn from_config(config: &Config) -> Result<Self, AdminError> {
        let auth = AuthClient::new(config.effective_auth_base_url(), config.auth_timeout())?;
        Ok(Self::new(
            auth,
            Box::new(FileStorage::new(paths::remembered_session_path())),
            Box::new(FileStorage::new(paths::scoped_session_path(config))),
        ))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        match &self.state {
            SessionState::Authenticated { user, .. } => Some(user),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { token, .. } => Some(token),
            SessionState::Unauthenticated => None,
        }
    }

    /// Builds an API client for `base_url` carrying the held token.
    ///
    /// # Errors
    /// Returns a `Validation` error if `base_url` is invalid.
    pub fn api_client(&self, base_url: &str) -> Result<ApiClient, AdminError> {
        ApiClient::new(base_url, self.token().map(ToString::to_string))
    }

    /// Hydrates state from durable storage.
    ///
    /// The long-lived tier wins over the session-scoped tier. A corrupt record
    /// in either is treated as "no session": both tiers are cleared.
    pub fn restore(&mut self) -> &SessionState {
        self.state = match self.read_persisted() {
            Ok(Some((token, user))) => {
                info!(uid = %user.uid, "restored session");
                SessionState::Authenticated { token, user }
            }
            Ok(None) => SessionState::Unauthenticated,
            Err(err) => {
                warn!("discarding unreadable stored session: {err:#}");
                self.clear_all_tiers();
                SessionState::Unauthenticated
            }
        };
        &self.state
    }

    fn read_persisted(&self) -> anyhow::Result<Option<(String, UserIdentity)>> {
        for store in [&self.long_lived, &self.session_scoped] {
            let token = store.get(TOKEN_KEY)?;
            let user = store.get(USER_KEY)?;
            if let (Some(token), Some(user)) = (token, user) {
                let user: UserIdentity =
                    serde_json::from_str(&user).context("Failed to parse stored user record")?;
                return Ok(Some((token, user)));
            }
        }
        Ok(None)
    }

    /// Sends a one-time password to `phone`. Does not change state.
    ///
    /// # Errors
    /// `Network` when the service is unreachable, `Service` otherwise.
    pub async fn request_otp(&self, phone: &str) -> Result<(), AdminError> {
        self.auth.request_otp(phone).await
    }

    /// Exchanges phone + code for a session.
    ///
    /// On `SignedIn` the session is persisted to the long-lived tier when
    /// `remember` is set, otherwise to the session-scoped tier, and removed
    /// from the other tier. State only changes once storage is written; a
    /// failed write leaves the primary tier as it was.
    ///
    /// # Errors
    /// `Auth` when rejected, `Network` on transport failure, `Decode` for an
    /// unreadable token, `Storage` when persisting fails.
    pub async fn verify_otp(
        &mut self,
        phone: &str,
        code: &str,
        remember: bool,
    ) -> Result<VerifyOutcome, AdminError> {
        let verification = self.auth.verify_otp(phone, code).await?;
        if !verification.account_exists {
            info!("otp verified; no account for this phone");
            return Ok(VerifyOutcome::AccountMissing);
        }

        let token = verification
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AdminError::decode("Verification succeeded but no token was returned"))?;
        let user = decode_identity(&token)?;

        self.persist(&token, &user, StorageTier::for_remember(remember))
            .map_err(|e| AdminError::storage(format!("Failed to save session: {e:#}")))?;

        info!(uid = %user.uid, remember, "signed in");
        self.state = SessionState::Authenticated {
            token,
            user: user.clone(),
        };
        Ok(VerifyOutcome::SignedIn(user))
    }

    fn persist(
        &mut self,
        token: &str,
        user: &UserIdentity,
        tier: StorageTier,
    ) -> anyhow::Result<()> {
        let user_json = serde_json::to_string(user).context("Failed to serialize user record")?;
        let (primary, other) = match tier {
            StorageTier::LongLived => (&mut self.long_lived, &mut self.session_scoped),
            StorageTier::SessionScoped => (&mut self.session_scoped, &mut self.long_lived),
        };

        // Unreadable previous values are not restored on rollback.
        let previous_token = primary.get(TOKEN_KEY).ok().flatten();
        let previous_user = primary.get(USER_KEY).ok().flatten();

        let saved = primary
            .set_many(&[(TOKEN_KEY, token), (USER_KEY, user_json.as_str())])
            .and_then(|()| remove_session_keys(other.as_mut()));
        if let Err(err) = saved {
            let rollback = match (previous_token.as_deref(), previous_user.as_deref()) {
                (Some(old_token), Some(old_user)) => {
                    primary.set_many(&[(TOKEN_KEY, old_token), (USER_KEY, old_user)])
                }
                _ => remove_session_keys(primary.as_mut()),
            };
            if let Err(rollback_err) = rollback {
                warn!("failed to roll back partially saved session: {rollback_err:#}");
            }
            return Err(err);
        }
        Ok(())
    }

    /// Submits an admin registration with whatever token is currently held.
    ///
    /// Does not establish a session.
    ///
    /// # Errors
    /// `Validation` with the server message, or `Network`.
    pub async fn register_admin(&self, request: &RegistrationRequest) -> Result<(), AdminError> {
        self.auth.register_admin(request, self.token()).await
    }

    /// Ends the session and removes it from both tiers.
    ///
    /// Idempotent. Returns whether a session was held.
    ///
    /// # Errors
    /// `Storage` if a tier cannot be cleared; in-memory state is reset regardless.
    pub fn logout(&mut self) -> Result<bool, AdminError> {
        let had_session = self.state.is_authenticated();
        self.state = SessionState::Unauthenticated;

        let mut failures = Vec::new();
        for store in [&mut self.long_lived, &mut self.session_scoped] {
            if let Err(err) = remove_session_keys(store.as_mut()) {
                failures.push(format!("{err:#}"));
            }
        }

        if had_session {
            info!("signed out");
        }
        if failures.is_empty() {
            Ok(had_session)
        } else {
            Err(AdminError::storage(format!(
                "Failed to clear stored session: {}",
                failures.join("; ")
            )))
        }
    }

    fn clear_all_tiers(&mut self) {
        for store in [&mut self.long_lived, &mut self.session_scoped] {
            if let Err(err) = store.clear() {
                warn!("failed to clear session store: {err:#}");
            }
        }
    }
}

/// Removes both session keys, falling back to wiping the store.
fn remove_session_keys(store: &mut dyn Storage) -> anyhow::Result<()> {
    store
        .remove(TOKEN_KEY)
        .and_then(|()| store.remove(USER_KEY))
        .or_else(|_| store.clear())
}
