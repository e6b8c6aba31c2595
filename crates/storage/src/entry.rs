use tokio::time::{Duration, Instant};

/// Place vivo: nome de exibição + último heartbeat.
#[derive(Debug, Clone)]
pub(crate) struct PlaceEntry {
    pub display_name: String,
    pub last_seen: Instant,
}

impl PlaceEntry {
    pub fn new(display_name: String, last_seen: Instant) -> Self {
        Self {
            display_name,
            last_seen,
        }
    }

    /// Estritamente maior: uma entrada exatamente no limite ainda está viva.
    pub fn is_stale(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) > ttl
    }
}

/// Script pendente: payload + instante da (re)submissão + prazo agendado.
#[derive(Debug, Clone)]
pub(crate) struct PendingScript {
    pub script: String,
    pub added_at: Instant,
    pub deadline: Instant,
}

impl PendingScript {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    pub fn expires_in(&self, now: Instant, ttl: Duration) -> Duration {
        ttl.saturating_sub(now.saturating_duration_since(self.added_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_boundary_is_live() {
        let t0 = Instant::now();
        let ttl = Duration::from_millis(30_000);
        let entry = PlaceEntry::new("A".into(), t0);
        assert!(!entry.is_stale(t0 + ttl, ttl));
        assert!(entry.is_stale(t0 + ttl + Duration::from_millis(1), ttl));
    }

    #[test]
    fn expires_in_floors_at_zero() {
        let t0 = Instant::now();
        let ttl = Duration::from_millis(10_000);
        let entry = PendingScript {
            script: "foo".into(),
            added_at: t0,
            deadline: t0 + ttl,
        };
        assert_eq!(entry.expires_in(t0, ttl), ttl);
        assert_eq!(
            entry.expires_in(t0 + Duration::from_secs(60), ttl),
            Duration::ZERO
        );
        assert!(entry.is_expired(t0 + ttl));
    }
}
