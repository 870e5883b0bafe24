//! Session and activity guard.
//!
//! Tracks whether an operator is signed in and expires the session after a
//! period without activity. Views only exist while the session is
//! authenticated; the CLI drops its handles once the session expires.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::lock;
use crate::config::SessionSettings;

const SOURCE: &str = "application::session";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Principal {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(Principal),
    /// Signed out by the idle timeout.
    Expired,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

struct SessionInner {
    idle_timeout: Duration,
    check_interval: Duration,
    state: watch::Sender<SessionState>,
    last_activity: Mutex<Instant>,
}

#[derive(Clone)]
pub struct SessionGuard {
    inner: Arc<SessionInner>,
}

impl SessionGuard {
    pub fn new(settings: &SessionSettings) -> Self {
        let (state, _) = watch::channel(SessionState::Anonymous);
        Self {
            inner: Arc::new(SessionInner {
                idle_timeout: settings.idle_timeout,
                check_interval: settings.check_interval,
                state,
                last_activity: Mutex::new(Instant::now()),
            }),
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.inner.idle_timeout
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn sign_in(&self, principal: Principal) {
        self.reset_activity();
        info!(user = %principal.username, "Session started");
        self.inner
            .state
            .send_replace(SessionState::Authenticated(principal));
    }

    pub fn sign_out(&self) {
        let previous = self.inner.state.send_replace(SessionState::Anonymous);
        if previous.is_authenticated() {
            info!("Session ended");
        }
    }

    /// Record operator activity. Ignored unless a session is active.
    pub fn touch(&self) {
        if self.is_authenticated() {
            self.reset_activity();
        }
    }

    /// Time since the last recorded activity.
    pub fn idle_for(&self) -> Duration {
        let last = *lock::lock(&self.inner.last_activity, SOURCE, "idle_for");
        Instant::now().saturating_duration_since(last)
    }

    /// Expire the session if it has been idle for the configured timeout.
    ///
    /// Returns `true` when this call expired it.
    pub fn check_idle(&self) -> bool {
        let idle_for = self.idle_for();
        let expired = self.inner.state.send_if_modified(|state| {
            if state.is_authenticated() && idle_for >= self.inner.idle_timeout {
                *state = SessionState::Expired;
                true
            } else {
                false
            }
        });

        if expired {
            info!(idle_secs = idle_for.as_secs(), "Session expired after inactivity");
        }
        expired
    }

    /// Wait until the session is no longer authenticated.
    pub async fn ended(&self) {
        let mut receiver = self.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = receiver.wait_for(|state| !state.is_authenticated()).await;
    }

    /// Periodically run [`check_idle`](Self::check_idle) until the session ends.
    pub fn spawn_idle_watch(&self) -> JoinHandle<()> {
        let guard = self.clone();
        tokio::spawn(async move {
            let period = guard.inner.check_interval;
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if guard.check_idle() || !guard.is_authenticated() {
                    debug!("Idle watch stopped");
                    break;
                }
            }
        })
    }

    fn reset_activity(&self) {
        *lock::lock(&self.inner.last_activity, SOURCE, "reset_activity") = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> SessionGuard {
        SessionGuard::new(&SessionSettings {
            idle_timeout: Duration::from_secs(60),
            check_interval: Duration::from_secs(10),
        })
    }

    #[test]
    fn starts_anonymous() {
        let guard = guard();
        assert_eq!(guard.state(), SessionState::Anonymous);
        assert!(!guard.check_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn expires_after_idle_timeout() {
        let guard = guard();
        guard.sign_in(Principal::new("aminata"));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(!guard.check_idle());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(guard.check_idle());
        assert_eq!(guard.state(), SessionState::Expired);

        // Already expired.
        assert!(!guard.check_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn touch_postpones_expiry() {
        let guard = guard();
        guard.sign_in(Principal::new("aminata").with_role("manager"));

        tokio::time::advance(Duration::from_secs(45)).await;
        guard.touch();
        tokio::time::advance(Duration::from_secs(45)).await;
        assert!(!guard.check_idle());
        assert!(guard.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_watch_expires_and_notifies_subscribers() {
        let guard = guard();
        guard.sign_in(Principal::new("ousmane"));
        let mut receiver = guard.subscribe();
        receiver.mark_unchanged();

        let watch = guard.spawn_idle_watch();
        guard.ended().await;

        assert_eq!(guard.state(), SessionState::Expired);
        assert!(receiver.has_changed().expect("sender alive"));
        watch.await.expect("idle watch task");
    }

    #[tokio::test]
    async fn sign_out_returns_to_anonymous() {
        let guard = guard();
        guard.sign_in(Principal::new("ousmane"));
        guard.sign_out();
        assert_eq!(guard.state(), SessionState::Anonymous);
        guard.ended().await;
    }
}
