use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use voltride_core::{BookingSession, CodeIssuer, SessionConfig, VehicleResolver};
use voltride_shared::BookingPhase;

/// One booking session per rider, created on first use.
///
/// Entries live only while they matter: a session that is `Idle` and not held
/// by any caller is dropped, either right after the call that closed it or on
/// the next insert (which covers trips that expired on their own).
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<BookingSession>>>,
    config: SessionConfig,
    resolver: Arc<dyn VehicleResolver>,
    issuer: Arc<dyn CodeIssuer>,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig, resolver: Arc<dyn VehicleResolver>) -> Self {
        let issuer = config.issuer();
        Self {
            sessions: Mutex::new(HashMap::new()),
            config,
            resolver,
            issuer,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<BookingSession>>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Shared handle to the rider's session. The entry stays registered for as
    /// long as the handle is alive.
    pub fn session_for(&self, rider_id: &str) -> Arc<BookingSession> {
        let mut sessions = self.lock();
        if let Some(session) = sessions.get(rider_id) {
            return session.clone();
        }

        let evicted = evict_idle(&mut sessions);
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted idle booking sessions");
        }

        tracing::debug!(rider_id, "Creating booking session");
        let session = Arc::new(BookingSession::with_issuer(
            self.config.clone(),
            self.resolver.clone(),
            self.issuer.clone(),
        ));
        sessions.insert(rider_id.to_string(), session.clone());
        session
    }

    /// Run `f` against the rider's session, then drop the entry if the session
    /// ended up idle.
    pub fn with_session<T>(&self, rider_id: &str, f: impl FnOnce(&BookingSession) -> T) -> T {
        let session = self.session_for(rider_id);
        let output = f(&session);
        drop(session);
        self.release(rider_id);
        output
    }

    /// Forget the rider's session if it is idle and nobody else holds it.
    pub fn release(&self, rider_id: &str) -> bool {
        let mut sessions = self.lock();
        let reclaimable = sessions.get(rider_id).is_some_and(is_reclaimable);
        if reclaimable {
            sessions.remove(rider_id);
            tracing::debug!(rider_id, "Released booking session");
        }
        reclaimable
    }

    /// Drop every idle, unheld session. Returns how many were removed.
    pub fn prune_idle(&self) -> usize {
        evict_idle(&mut self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_reclaimable(session: &Arc<BookingSession>) -> bool {
    Arc::strong_count(session) == 1 && session.current_phase() == BookingPhase::Idle
}

fn evict_idle(sessions: &mut HashMap<String, Arc<BookingSession>>) -> usize {
    let before = sessions.len();
    sessions.retain(|_, session| !is_reclaimable(session));
    before - sessions.len()
}
