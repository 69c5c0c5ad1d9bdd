//! Opponent presence and the turn clock.
//!
//! Both machines are driven with explicit `Instant`s so the coordinator
//! can feed them from its poll loop and tests can step time by hand.

use std::time::{Duration, Instant};

use crate::core::PlayerNum;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresenceState {
    Connected,
    /// Our own link is down, so the opponent's flag is not trusted.
    Disconnected,
    GracePending { deadline: Instant },
    Forfeited,
}

/// Observable change from a presence update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    OpponentDisconnected,
    OpponentReconnected,
    GraceExpired,
    LinkLost,
    LinkRestored,
}

/// Tracks the opponent's `connected` flag against a grace window.
///
/// The flag is only acted on while our own link is up. When our link
/// comes back the remembered flag is re-evaluated.
#[derive(Clone, Debug)]
pub struct PresenceMachine {
    state: PresenceState,
    grace: Duration,
    link_up: bool,
    opponent_connected: bool,
}

impl PresenceMachine {
    #[must_use]
    pub fn new(grace: Duration) -> Self {
        Self {
            state: PresenceState::Connected,
            grace,
            link_up: true,
            opponent_connected: true,
        }
    }

    #[must_use]
    pub fn state(&self) -> PresenceState {
        self.state
    }

    #[must_use]
    pub fn is_forfeited(&self) -> bool {
        self.state == PresenceState::Forfeited
    }

    /// Time left in the grace window.
    #[must_use]
    pub fn grace_remaining(&self, now: Instant) -> Option<Duration> {
        match self.state {
            PresenceState::GracePending { deadline } => Some(deadline.saturating_duration_since(now)),
            _ => None,
        }
    }

    /// The opponent's `connected` flag changed.
    pub fn opponent_flag(&mut self, connected: bool, now: Instant) -> Option<Transition> {
        self.opponent_connected = connected;
        if !self.link_up {
            return None;
        }
        self.evaluate(now)
    }

    /// Our own store connection changed.
    pub fn link(&mut self, up: bool, now: Instant) -> Option<Transition> {
        if self.is_forfeited() || up == self.link_up {
            return None;
        }
        self.link_up = up;
        if !up {
            self.state = PresenceState::Disconnected;
            return Some(Transition::LinkLost);
        }
        self.state = PresenceState::Connected;
        match self.evaluate(now) {
            Some(Transition::OpponentDisconnected) => Some(Transition::OpponentDisconnected),
            _ => Some(Transition::LinkRestored),
        }
    }

    /// Expire the grace window if its deadline has passed.
    pub fn tick(&mut self, now: Instant) -> Option<Transition> {
        match self.state {
            PresenceState::GracePending { deadline } if now >= deadline => {
                self.state = PresenceState::Forfeited;
                Some(Transition::GraceExpired)
            }
            _ => None,
        }
    }

    /// Stop watching, for when the match has ended.
    pub fn cancel(&mut self) {
        if let PresenceState::GracePending { .. } = self.state {
            self.state = PresenceState::Connected;
        }
    }

    fn evaluate(&mut self, now: Instant) -> Option<Transition> {
        match (self.state, self.opponent_connected) {
            (PresenceState::Forfeited, _) => None,
            (PresenceState::GracePending { .. }, true) => {
                self.state = PresenceState::Connected;
                Some(Transition::OpponentReconnected)
            }
            (PresenceState::Connected | PresenceState::Disconnected, false) => {
                self.state = PresenceState::GracePending {
                    deadline: now + self.grace,
                };
                Some(Transition::OpponentDisconnected)
            }
            _ => None,
        }
    }
}

/// Per-turn countdown restarted whenever the turn owner changes.
#[derive(Clone, Debug)]
pub struct TurnTimer {
    limit: Duration,
    owner: Option<(PlayerNum, Instant)>,
    fired: bool,
}

impl TurnTimer {
    #[must_use]
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            owner: None,
            fired: false,
        }
    }

    /// Note the current turn owner. Restarts the clock on a change.
    pub fn observe(&mut self, current_player: PlayerNum, now: Instant) {
        let changed = self.owner.map_or(true, |(owner, _)| owner != current_player);
        if changed {
            self.owner = Some((current_player, now));
            self.fired = false;
        }
    }

    #[must_use]
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.owner
            .map(|(_, start)| self.limit.saturating_sub(now.saturating_duration_since(start)))
    }

    /// True exactly once per turn when `local` owns the turn and the limit
    /// has elapsed.
    pub fn check(&mut self, local: PlayerNum, now: Instant) -> bool {
        let Some((owner, start)) = self.owner else {
            return false;
        };
        if self.fired || owner != local || now.saturating_duration_since(start) < self.limit {
            return false;
        }
        self.fired = true;
        true
    }

    pub fn cancel(&mut self) {
        self.owner = None;
        self.fired = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE: Duration = Duration::from_secs(120);

    #[test]
    fn test_disconnect_then_expire() {
        let start = Instant::now();
        let mut presence = PresenceMachine::new(GRACE);

        assert_eq!(presence.opponent_flag(false, start), Some(Transition::OpponentDisconnected));
        assert_eq!(presence.tick(start + Duration::from_secs(60)), None);
        assert_eq!(presence.grace_remaining(start + Duration::from_secs(60)), Some(Duration::from_secs(60)));
        assert_eq!(presence.tick(start + GRACE), Some(Transition::GraceExpired));
        assert!(presence.is_forfeited());
        assert_eq!(presence.opponent_flag(true, start + GRACE), None);
    }

    #[test]
    fn test_reconnect_inside_grace() {
        let start = Instant::now();
        let mut presence = PresenceMachine::new(GRACE);

        presence.opponent_flag(false, start);
        assert_eq!(
            presence.opponent_flag(true, start + Duration::from_secs(30)),
            Some(Transition::OpponentReconnected)
        );
        assert_eq!(presence.tick(start + GRACE * 2), None);
        assert_eq!(presence.state(), PresenceState::Connected);
    }

    #[test]
    fn test_flag_ignored_while_link_down() {
        let start = Instant::now();
        let mut presence = PresenceMachine::new(GRACE);

        assert_eq!(presence.link(false, start), Some(Transition::LinkLost));
        assert_eq!(presence.opponent_flag(false, start), None);
        assert_eq!(presence.tick(start + GRACE * 2), None);

        // Link back: the remembered flag starts a fresh window.
        let later = start + GRACE * 2;
        assert_eq!(presence.link(true, later), Some(Transition::OpponentDisconnected));
        assert_eq!(presence.grace_remaining(later), Some(GRACE));
    }

    #[test]
    fn test_link_restored_with_opponent_present() {
        let start = Instant::now();
        let mut presence = PresenceMachine::new(GRACE);

        presence.link(false, start);
        assert_eq!(presence.link(true, start), Some(Transition::LinkRestored));
        assert_eq!(presence.link(true, start), None);
    }

    #[test]
    fn test_turn_timer_fires_once_for_owner() {
        let start = Instant::now();
        let limit = Duration::from_secs(60);
        let mut timer = TurnTimer::new(limit);

        timer.observe(PlayerNum::One, start);
        assert!(!timer.check(PlayerNum::One, start + Duration::from_secs(59)));
        assert!(!timer.check(PlayerNum::Two, start + limit));
        assert!(timer.check(PlayerNum::One, start + limit));
        assert!(!timer.check(PlayerNum::One, start + limit * 2));

        // Same owner observed again keeps the old start.
        timer.observe(PlayerNum::One, start + limit * 2);
        assert!(!timer.check(PlayerNum::One, start + limit * 3));

        timer.observe(PlayerNum::Two, start + limit * 3);
        assert_eq!(timer.remaining(start + limit * 3), Some(limit));
    }
}
