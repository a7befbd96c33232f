//! Time-derived ticket and request ids.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Which side request an id acknowledges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketKind {
    Sandbox,
    DummyData,
}

impl TicketKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Sandbox => "SANDBOX",
            Self::DummyData => "DUMMY",
        }
    }
}

/// Issues `<PREFIX>-<micros>` ids that strictly increase within a process,
/// even when the clock has not moved between two calls.
#[derive(Debug, Default)]
pub struct TicketIssuer {
    last: AtomicI64,
}

impl TicketIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, kind: TicketKind) -> String {
        let now = Utc::now().timestamp_micros();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return format!("{}-{}", kind.prefix(), next),
                Err(current) => last = current,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    #[test]
    fn ids_carry_prefix_and_timestamp() {
        let issuer = TicketIssuer::new();
        let before = Utc::now().timestamp_micros();
        let id = issuer.issue(TicketKind::Sandbox);
        let digits = id.strip_prefix("SANDBOX-").unwrap();
        let micros: i64 = digits.parse().unwrap();
        assert!(micros >= before);

        assert!(issuer.issue(TicketKind::DummyData).starts_with("DUMMY-"));
    }

    #[test]
    fn back_to_back_ids_differ() {
        let issuer = TicketIssuer::new();
        let ids: Vec<String> = (0..1000).map(|_| issuer.issue(TicketKind::Sandbox)).collect();
        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn ids_unique_across_threads() {
        let issuer = Arc::new(TicketIssuer::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let issuer = Arc::clone(&issuer);
                std::thread::spawn(move || {
                    (0..250)
                        .map(|_| issuer.issue(TicketKind::DummyData))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut all = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(all.insert(id), "duplicate id issued");
            }
        }
        assert_eq!(all.len(), 1000);
    }
}
