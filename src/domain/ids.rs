use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Issues order and top-up ids that are unique and sort by creation time.
///
/// The numeric part starts from the wall clock in microseconds and is forced
/// strictly upward, so two requests in the same tick (or a clock step back)
/// still get distinct, ordered ids.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_value(&self) -> u64 {
        let now = Utc::now().timestamp_micros().max(0) as u64;
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    pub fn order_id(&self) -> String {
        format!("ORD{:016}", self.next_value())
    }

    pub fn topup_id(&self) -> String {
        format!("TOP{:016}", self.next_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_ids_are_strictly_increasing() {
        let ids = IdGenerator::new();
        let generated: Vec<String> = (0..1000).map(|_| ids.order_id()).collect();
        let mut sorted = generated.clone();
        sorted.sort();
        assert_eq!(generated, sorted);
        assert_eq!(generated.iter().collect::<HashSet<_>>().len(), 1000);
    }

    #[test]
    fn test_ids_unique_across_threads() {
        let ids = Arc::new(IdGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..500).map(|_| ids.topup_id()).collect::<Vec<_>>())
            })
            .collect();

        let all: HashSet<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(all.len(), 2000);
        assert!(all.iter().all(|id| id.starts_with("TOP")));
    }
}
