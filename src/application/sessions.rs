use crate::domain::ports::{UserStore, UserStoreBox};
use crate::domain::user::{hash_password, Identity};
use crate::domain::UserId;
use crate::error::{MarketError, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// Idle minutes after which a token stops being accepted.
const DEFAULT_IDLE_TTL_MINUTES: i64 = 30;

struct Session {
    user: UserId,
    is_admin: bool,
    last_seen: DateTime<Utc>,
}

/// Issues opaque session tokens and resolves them back to caller identities.
///
/// Expiry is checked lazily against the stored timestamp at lookup time;
/// there is no background sweeper, and the service owns its session map
/// outright.
pub struct SessionService {
    users: UserStoreBox,
    sessions: RwLock<HashMap<String, Session>>,
    idle_ttl: Duration,
}

impl SessionService {
    pub fn new(users: UserStoreBox) -> Self {
        Self::with_idle_ttl(users, Duration::minutes(DEFAULT_IDLE_TTL_MINUTES))
    }

    pub fn with_idle_ttl(users: UserStoreBox, idle_ttl: Duration) -> Self {
        Self {
            users,
            sessions: RwLock::new(HashMap::new()),
            idle_ttl,
        }
    }

    /// Verifies the credentials and returns a session token.
    ///
    /// A user who is already logged in gets their existing token back with a
    /// refreshed lease instead of a second session.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(MarketError::NotAuthorized("unknown username or password"))?;
        if user.password_hash != hash_password(password) {
            return Err(MarketError::NotAuthorized("unknown username or password"));
        }

        let mut sessions = self.sessions.write().await;
        let existing = sessions
            .iter()
            .find_map(|(token, session)| (session.user == user.id).then(|| token.clone()));
        if let Some(token) = existing {
            if let Some(session) = sessions.get_mut(&token) {
                session.last_seen = Utc::now();
            }
            return Ok(token);
        }

        let token = format!("{:032x}", rand::random::<u128>());
        sessions.insert(
            token.clone(),
            Session {
                user: user.id,
                is_admin: user.is_admin,
                last_seen: Utc::now(),
            },
        );
        info!(user = user.id, "session issued");
        Ok(token)
    }

    /// Resolves a token to the caller identity, refreshing its lease.
    ///
    /// A token whose idle time exceeds the TTL is dropped here, at lookup.
    pub async fn authenticate(&self, token: &str) -> Result<Identity> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(token) else {
            return Err(MarketError::NotAuthorized("invalid session token"));
        };
        if Utc::now() - session.last_seen > self.idle_ttl {
            sessions.remove(token);
            info!("expired session dropped");
            return Err(MarketError::NotAuthorized("session expired"));
        }
        session.last_seen = Utc::now();
        Ok(Identity {
            account: session.user,
            is_admin: session.is_admin,
        })
    }

    /// Drops a session. Returns whether the token was live.
    pub async fn logout(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    #[cfg(test)]
    async fn backdate(&self, token: &str, last_seen: DateTime<Utc>) {
        if let Some(session) = self.sessions.write().await.get_mut(token) {
            session.last_seen = last_seen;
        }
    }
}
