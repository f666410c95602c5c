// @awa-component: ACC-SessionObserver
//
//! Session observer. Re-evaluates the access policy when the route, the
//! authentication state or the entitlement changes.
//!
//! The transition logic is the pure [`reduce`] function. [`SessionObserver`]
//! wraps it with an event queue that is drained to completion on every
//! [`SessionObserver::process`] call, so hosts can feed it from any callback
//! without re-entrancy.

use std::collections::VecDeque;

use log::debug;
use serde::Serialize;

use super::{Decision, decide};

/// Observer states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Loading,
    Unauthenticated,
    AuthenticatedNoSubscription,
    AuthenticatedEntitled,
}

impl SessionState {
    fn resolved(authenticated: bool, entitled: bool) -> Self {
        match (authenticated, entitled) {
            (false, _) => Self::Unauthenticated,
            (true, false) => Self::AuthenticatedNoSubscription,
            (true, true) => Self::AuthenticatedEntitled,
        }
    }

    pub fn is_authenticated(self) -> bool {
        matches!(
            self,
            Self::AuthenticatedNoSubscription | Self::AuthenticatedEntitled
        )
    }

    pub fn is_entitled(self) -> bool {
        self == Self::AuthenticatedEntitled
    }
}

/// Inputs reported by the identity collaborator and the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Authentication started (initial load or re-authentication).
    AuthLoading,
    /// Loading finished with a definite answer.
    AuthResolved { authenticated: bool, entitled: bool },
    /// Logout, token expiry or any other loss of authentication.
    AuthLost,
    /// Entitlement recomputed after a refresh or an admin command.
    EntitlementChanged { entitled: bool },
    /// The router moved to a new path.
    RouteChanged(String),
}

/// Side effects requested by the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Navigate(Decision),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct EvaluationKey {
    route: String,
    authenticated: bool,
    entitled: bool,
}

/// Observer state between events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub route: String,
    last_evaluated: Option<EvaluationKey>,
}

impl SessionSnapshot {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            state: SessionState::Loading,
            route: route.into(),
            last_evaluated: None,
        }
    }

    /// Current policy decision; `None` while loading.
    pub fn decision(&self) -> Option<Decision> {
        decide(
            &self.route,
            self.state.is_authenticated(),
            self.state == SessionState::Loading,
            self.state.is_entitled(),
        )
    }
}

/// Apply one event. Returns the next snapshot and the effects to perform.
pub fn reduce(snapshot: &SessionSnapshot, event: &SessionEvent) -> (SessionSnapshot, Vec<Effect>) {
    let mut next = snapshot.clone();

    match event {
        SessionEvent::AuthLoading => {
            next.state = SessionState::Loading;
            next.last_evaluated = None;
        }
        SessionEvent::AuthResolved {
            authenticated,
            entitled,
        } => {
            next.state = SessionState::resolved(*authenticated, *entitled);
        }
        SessionEvent::AuthLost => {
            next.state = SessionState::Unauthenticated;
        }
        SessionEvent::EntitlementChanged { entitled } => {
            // Entitlement only matters for an authenticated session; while
            // loading the resolved event carries it.
            if next.state.is_authenticated() {
                next.state = SessionState::resolved(true, *entitled);
            }
        }
        SessionEvent::RouteChanged(route) => {
            next.route = route.clone();
        }
    }

    if next.state != snapshot.state {
        debug!(
            "session observer: {:?} -> {:?} on {:?}",
            snapshot.state, next.state, event
        );
    }

    let effects = evaluate(&mut next);
    (next, effects)
}

fn evaluate(snapshot: &mut SessionSnapshot) -> Vec<Effect> {
    let Some(decision) = snapshot.decision() else {
        return Vec::new();
    };

    let key = EvaluationKey {
        route: snapshot.route.clone(),
        authenticated: snapshot.state.is_authenticated(),
        entitled: snapshot.state.is_entitled(),
    };
    if snapshot.last_evaluated.as_ref() == Some(&key) {
        return Vec::new();
    }
    snapshot.last_evaluated = Some(key);

    match decision {
        Decision::Allow => Vec::new(),
        redirect => vec![Effect::Navigate(redirect)],
    }
}

/// Queue-driven wrapper around [`reduce`].
#[derive(Debug)]
pub struct SessionObserver {
    snapshot: SessionSnapshot,
    queue: VecDeque<SessionEvent>,
}

impl SessionObserver {
    /// Start in `Loading` on `route`.
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            snapshot: SessionSnapshot::new(route),
            queue: VecDeque::new(),
        }
    }

    /// Enqueue an event. Nothing happens until [`process`](Self::process).
    pub fn push(&mut self, event: SessionEvent) {
        self.queue.push_back(event);
    }

    /// Drain the queue, returning effects in the order they were produced.
    pub fn process(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        while let Some(event) = self.queue.pop_front() {
            let (next, produced) = reduce(&self.snapshot, &event);
            self.snapshot = next;
            effects.extend(produced);
        }
        effects
    }

    /// Push one event and process the whole queue.
    pub fn dispatch(&mut self, event: SessionEvent) -> Vec<Effect> {
        self.push(event);
        self.process()
    }

    pub fn state(&self) -> SessionState {
        self.snapshot.state
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(authenticated: bool, entitled: bool) -> SessionEvent {
        SessionEvent::AuthResolved {
            authenticated,
            entitled,
        }
    }

    fn route(path: &str) -> SessionEvent {
        SessionEvent::RouteChanged(path.to_string())
    }

    const TO_PROFILE: Effect = Effect::Navigate(Decision::RedirectProfile);
    const TO_LOGIN: Effect = Effect::Navigate(Decision::RedirectLogin);

    #[test]
    fn loading_suspends_everything() {
        let mut obs = SessionObserver::new("/library");
        assert!(obs.dispatch(route("/favorites")).is_empty());
        assert!(obs.dispatch(SessionEvent::EntitlementChanged { entitled: false }).is_empty());
        assert_eq!(obs.state(), SessionState::Loading);
        assert_eq!(obs.snapshot().decision(), None);
        assert_eq!(obs.snapshot().route, "/favorites");
    }

    #[test]
    fn resolution_leaves_loading() {
        for (auth, entitled, state) in [
            (false, false, SessionState::Unauthenticated),
            (false, true, SessionState::Unauthenticated),
            (true, false, SessionState::AuthenticatedNoSubscription),
            (true, true, SessionState::AuthenticatedEntitled),
        ] {
            let mut obs = SessionObserver::new("/profile");
            obs.dispatch(resolved(auth, entitled));
            assert_eq!(obs.state(), state);
        }
    }

    #[test]
    fn unsubscribed_member_on_gated_route_is_sent_to_profile() {
        let mut obs = SessionObserver::new("/library");
        assert_eq!(obs.dispatch(resolved(true, false)), vec![TO_PROFILE]);
    }

    #[test]
    fn entitled_member_stays() {
        let mut obs = SessionObserver::new("/library");
        assert!(obs.dispatch(resolved(true, true)).is_empty());
    }

    #[test]
    fn repeated_identical_evaluation_does_not_renavigate() {
        let mut obs = SessionObserver::new("/library");
        assert_eq!(obs.dispatch(resolved(true, false)), vec![TO_PROFILE]);
        assert!(obs.dispatch(resolved(true, false)).is_empty());
        assert!(obs.dispatch(route("/library")).is_empty());
        assert!(obs.dispatch(SessionEvent::EntitlementChanged { entitled: false }).is_empty());
    }

    #[test]
    fn returning_to_gated_route_redirects_again() {
        let mut obs = SessionObserver::new("/library");
        assert_eq!(obs.dispatch(resolved(true, false)), vec![TO_PROFILE]);
        assert!(obs.dispatch(route("/profile")).is_empty());
        assert_eq!(obs.dispatch(route("/library")), vec![TO_PROFILE]);
    }

    #[test]
    fn lapse_while_mounted_redirects_only_on_gated_route() {
        let mut obs = SessionObserver::new("/history/5");
        obs.dispatch(resolved(true, true));
        let effects = obs.dispatch(SessionEvent::EntitlementChanged { entitled: false });
        assert_eq!(effects, vec![TO_PROFILE]);
        assert_eq!(obs.state(), SessionState::AuthenticatedNoSubscription);

        let mut obs = SessionObserver::new("/profile");
        obs.dispatch(resolved(true, true));
        assert!(obs.dispatch(SessionEvent::EntitlementChanged { entitled: false }).is_empty());
    }

    #[test]
    fn regaining_access_has_no_effect() {
        let mut obs = SessionObserver::new("/profile");
        obs.dispatch(resolved(true, false));
        let effects = obs.dispatch(SessionEvent::EntitlementChanged { entitled: true });
        assert!(effects.is_empty());
        assert_eq!(obs.state(), SessionState::AuthenticatedEntitled);
    }

    #[test]
    fn auth_loss_redirects_to_login_from_any_state() {
        let mut obs = SessionObserver::new("/profile");
        obs.dispatch(resolved(true, true));
        assert_eq!(obs.dispatch(SessionEvent::AuthLost), vec![TO_LOGIN]);
        assert_eq!(obs.state(), SessionState::Unauthenticated);
        assert!(obs.dispatch(SessionEvent::AuthLost).is_empty());

        let mut obs = SessionObserver::new("/");
        assert_eq!(obs.dispatch(SessionEvent::AuthLost), vec![TO_LOGIN]);
    }

    #[test]
    fn entitlement_is_ignored_when_unauthenticated() {
        let mut obs = SessionObserver::new("/library");
        obs.dispatch(resolved(false, false));
        assert!(obs.dispatch(SessionEvent::EntitlementChanged { entitled: true }).is_empty());
        assert_eq!(obs.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn reauthentication_reevaluates_from_scratch() {
        let mut obs = SessionObserver::new("/library");
        assert_eq!(obs.dispatch(resolved(true, false)), vec![TO_PROFILE]);
        assert!(obs.dispatch(SessionEvent::AuthLoading).is_empty());
        assert_eq!(obs.state(), SessionState::Loading);
        assert_eq!(obs.dispatch(resolved(true, false)), vec![TO_PROFILE]);
    }

    #[test]
    fn queued_events_run_to_completion_in_order() {
        let mut obs = SessionObserver::new("/profile");
        obs.push(resolved(true, true));
        obs.push(route("/library"));
        obs.push(SessionEvent::EntitlementChanged { entitled: false });
        obs.push(SessionEvent::AuthLost);
        assert_eq!(obs.process(), vec![TO_PROFILE, TO_LOGIN]);
        assert!(obs.process().is_empty());
    }

    #[test]
    fn reduce_is_pure() {
        let start = SessionSnapshot::new("/library");
        let event = resolved(true, false);
        let (a, fx_a) = reduce(&start, &event);
        let (b, fx_b) = reduce(&start, &event);
        assert_eq!(a, b);
        assert_eq!(fx_a, fx_b);
        assert_eq!(start.state, SessionState::Loading);
    }
}
