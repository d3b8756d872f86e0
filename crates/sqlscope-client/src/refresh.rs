//! Single-flight access-token refresh.
//!
//! At most one refresh call is outstanding at a time. Callers arriving while
//! one is in flight are parked on a FIFO queue and receive the leader's
//! outcome once the Token Store has been updated.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use sqlscope_types::{AccessToken, TokenPair, failure_message, unwrap_envelope};
use tokio::sync::oneshot;
use url::Url;

use crate::error::RefreshError;
use crate::token_store::TokenStore;

/// Message used when the refresh endpoint gives no reason.
pub const REFRESH_FAILED: &str = "Refresh failed";

/// Result shared with every caller of one refresh.
pub type RefreshOutcome = Result<Option<AccessToken>, RefreshError>;

/// A caller waiting on the in-flight refresh.
type PendingRequest = oneshot::Sender<RefreshOutcome>;

#[derive(Default)]
struct FlightState {
    in_flight: bool,
    pending: VecDeque<PendingRequest>,
}

/// Coordinates refreshes against the gateway's `/api/auth/refresh`.
pub struct RefreshCoordinator {
    http: reqwest::Client,
    endpoint: Url,
    store: TokenStore,
    timeout: Duration,
    flight: Mutex<FlightState>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    /// `http` must carry the cookie jar holding the refresh cookie.
    pub fn new(http: reqwest::Client, endpoint: Url, store: TokenStore, timeout: Duration) -> Self {
        Self {
            http,
            endpoint,
            store,
            timeout,
            flight: Mutex::new(FlightState::default()),
        }
    }

    /// Whether a refresh is currently outstanding.
    pub fn is_refreshing(&self) -> bool {
        self.flight.lock().in_flight
    }

    /// Obtain a fresh access token, joining an in-flight refresh if any.
    ///
    /// On success the Token Store holds the new token (or nothing, when the
    /// gateway answered without one). On failure it has been cleared.
    pub async fn refresh(&self) -> RefreshOutcome {
        let waiter = {
            let mut state = self.flight.lock();
            if state.in_flight {
                let (tx, rx) = oneshot::channel();
                state.pending.push_back(tx);
                Some(rx)
            } else {
                state.in_flight = true;
                None
            }
        };

        if let Some(rx) = waiter {
            tracing::debug!("Joining in-flight refresh");
            return rx.await.unwrap_or(Err(RefreshError::Abandoned));
        }

        let guard = FlightGuard {
            coordinator: self,
            armed: true,
        };

        let outcome = self.call_endpoint().await;
        match &outcome {
            Ok(token) => {
                tracing::debug!(has_token = token.is_some(), "Access token refreshed");
                self.store.set(token.clone());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Refresh failed, clearing session");
                self.store.clear();
            }
        }

        guard.finish(outcome.clone());
        outcome
    }

    async fn call_endpoint(&self) -> RefreshOutcome {
        let exchange = async {
            let response = self
                .http
                .post(self.endpoint.clone())
                .json(&serde_json::json!({}))
                .send()
                .await
                .map_err(|e| RefreshError::Transport(e.to_string()))?;

            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| RefreshError::Transport(e.to_string()))?;
            let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

            if !status.is_success() {
                return Err(RefreshError::Rejected {
                    status: status.as_u16(),
                    message: failure_message(&body).unwrap_or_else(|| REFRESH_FAILED.to_string()),
                });
            }

            let unwrapped = unwrap_envelope(body);
            if let Some(error) = unwrapped.error {
                return Err(RefreshError::Rejected {
                    status: status.as_u16(),
                    message: error.message.unwrap_or_else(|| REFRESH_FAILED.to_string()),
                });
            }

            let data = unwrapped.data.unwrap_or(Value::Null);
            Ok(TokenPair::extract(&data).access_token)
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(outcome) => outcome,
            Err(_) => Err(RefreshError::Timeout(self.timeout)),
        }
    }

    /// Clear the flag and take the queue in one critical section.
    fn drain(&self) -> VecDeque<PendingRequest> {
        let mut state = self.flight.lock();
        state.in_flight = false;
        std::mem::take(&mut state.pending)
    }
}

/// Releases queued callers even if the leading future is dropped mid-refresh.
struct FlightGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    armed: bool,
}

impl FlightGuard<'_> {
    fn finish(mut self, outcome: RefreshOutcome) {
        self.armed = false;
        release(self.coordinator.drain(), outcome);
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            release(self.coordinator.drain(), Err(RefreshError::Abandoned));
        }
    }
}

fn release(pending: VecDeque<PendingRequest>, outcome: RefreshOutcome) {
    for waiter in pending {
        // A waiter whose caller went away is fine to skip.
        let _ = waiter.send(outcome.clone());
    }
}
