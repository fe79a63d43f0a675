//! Property tests for counters, feedback expiry, the watchdog and golden status.

use std::collections::BTreeMap;

use proptest::prelude::*;
use woodfish_core::fortune::Luck;
use woodfish_core::random::ScriptedSource;
use woodfish_core::{
    EngineSettings, Event, FortuneRecord, MemoryStore, MeritEngine, MeritState, Point, SilentSignals,
};

fn engine(store: MemoryStore, roll: f64) -> MeritEngine {
    MeritEngine::new(
        EngineSettings::default(),
        MeritState::load(store),
        ScriptedSource::new([roll]),
        SilentSignals,
    )
}

fn is_session_end(event: &Event) -> bool {
    matches!(event, Event::SessionEnded { .. } | Event::OutcomeRaised { .. })
}

/// Note the tick time of every expiry; an id expiring twice fails the case.
fn record_expired(events: Vec<Event>, now: u64, removed: &mut BTreeMap<u64, u64>) -> Result<(), TestCaseError> {
    for event in events {
        if let Event::FeedbackExpired { id, .. } = event {
            prop_assert!(removed.insert(id.get(), now).is_none(), "removed twice");
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn lifetime_count_grows_by_accepted_taps(
        before in 0u64..10_000,
        steps in proptest::collection::vec((0u64..12_000, any::<bool>()), 1..60),
        roll in 0.0f64..100.0,
    ) {
        let count = before.to_string();
        let store = MemoryStore::with_entries([("zen-merit-count", count.as_str())]);
        let mut engine = engine(store.clone(), roll);

        let mut now = 0;
        let mut accepted = 0u64;
        for (gap, automatic) in steps {
            now += gap;
            engine.tick(now);
            if engine.outcome().is_some() {
                engine.dismiss(now);
            }
            if engine.process_tap(Point::new(10.0, 10.0), automatic, now).is_some() {
                accepted += 1;
            }
        }

        prop_assert_eq!(engine.merit().lifetime_count(), before + accepted);
        let saved = store.snapshot();
        prop_assert_eq!(saved.get("zen-merit-count").cloned(), Some((before + accepted).to_string()));
    }

    #[test]
    fn feedback_items_expire_once_and_never_early(
        gaps in proptest::collection::vec(0u64..2_000, 1..40),
        checks in proptest::collection::vec(0u64..3_000, 0..40),
    ) {
        let mut engine = engine(MemoryStore::new(), 99.9);
        let mut expiries: BTreeMap<u64, u64> = BTreeMap::new();
        let mut removed: BTreeMap<u64, u64> = BTreeMap::new();
        let mut last_id: Option<u64> = None;

        let mut now = 0;
        let mut checks = checks.into_iter();
        for gap in gaps {
            now += gap;
            let ticked = engine.tick(now);
            record_expired(ticked, now, &mut removed)?;
            if engine.outcome().is_some() {
                engine.dismiss(now);
            }
            if let Some(Event::Tapped { feedback, .. }) = engine.process_tap(Point::new(0.0, 0.0), false, now) {
                let id = feedback.id.get();
                if let Some(prev) = last_id {
                    prop_assert!(id > prev);
                }
                last_id = Some(id);
                expiries.insert(id, feedback.expires_at_ms);
            }
            if let Some(p) = checks.next() {
                let ticked = engine.tick(now + p % 800);
                record_expired(ticked, now + p % 800, &mut removed)?;
                now += p % 800;
            }
        }
        let ticked = engine.tick(now + 1_000_000);
        record_expired(ticked, now + 1_000_000, &mut removed)?;

        prop_assert_eq!(expiries.len(), removed.len());
        for (id, expires_at) in &expiries {
            let removed_at = removed.get(id).copied();
            prop_assert!(removed_at.is_some());
            prop_assert!(removed_at.unwrap_or(0) >= *expires_at);
        }
        prop_assert!(engine.feedback().is_empty());
    }

    #[test]
    fn watchdog_stays_quiet_under_steady_tapping(
        gaps in proptest::collection::vec(0u64..5_000, 1..100),
    ) {
        let mut engine = engine(MemoryStore::new(), 99.9);
        let mut now = 0;
        for gap in gaps {
            now += gap;
            let events = engine.tick(now);
            prop_assert!(!events.iter().any(is_session_end));
            prop_assert!(engine.process_tap(Point::new(0.0, 0.0), false, now).is_some());
        }
    }

    #[test]
    fn watchdog_fires_once_per_quiet_gap(
        gaps in proptest::collection::vec(0u64..12_000, 1..60),
        roll in 0.0f64..100.0,
    ) {
        let mut engine = engine(MemoryStore::new(), roll);
        let mut now = 0;
        let mut fired = 0usize;
        let mut expected = 0usize;

        engine.process_tap(Point::new(0.0, 0.0), false, now);
        for gap in gaps {
            if gap >= 5_000 {
                expected += 1;
            }
            now += gap;
            fired += engine.tick(now).iter().filter(|e| is_session_end(e)).count();
            if engine.outcome().is_some() {
                engine.dismiss(now);
            }
            prop_assert!(engine.process_tap(Point::new(0.0, 0.0), false, now).is_some());
        }
        prop_assert_eq!(fired, expected);
    }

    #[test]
    fn golden_unlocks_at_most_once(
        tiers in proptest::collection::vec(0usize..6, 0..30),
    ) {
        let mut merit = MeritState::load(MemoryStore::new());
        let mut unlocks = 0;
        let mut saw_top = false;
        for tier in tiers {
            let luck = Luck::ALL[tier];
            saw_top |= luck.is_top_tier();
            let fortune = FortuneRecord { luck, ..FortuneRecord::fallback() };
            if merit.record_fortune(fortune) {
                unlocks += 1;
                prop_assert!(luck.is_top_tier());
            }
        }
        prop_assert!(unlocks <= 1);
        prop_assert_eq!(merit.is_golden(), saw_top);
        prop_assert_eq!(unlocks == 1, saw_top);
    }
}
