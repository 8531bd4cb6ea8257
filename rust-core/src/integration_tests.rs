/// Integration tests for the complete rep counting pipeline
/// Tests realistic exercise sessions end to end: single reps, repeated sets,
/// sustained poses, resets, and both detection modes.

#[cfg(test)]
mod integration_tests {
    use std::sync::{Arc, Mutex};

    use crate::latch::DebouncePolicy;
    use crate::pipeline::*;
    use crate::signal::ThresholdRule;
    use crate::types::*;

    /// 60Hz sample period, rounded to whole milliseconds.
    const PERIOD_MS: u64 = 16;

    /// Helper: one rep shaped over 30 samples, centred on sample 15.
    ///
    /// The forearm rotates (rotation_y dips) while the gravity vector swings
    /// on all three axes at the same moment.
    fn rep_cycle(t0: u64) -> Vec<MotionSample> {
        (0..30)
            .map(|i| {
                let d = (i as f64 - 15.0).abs();
                let bump = if d <= 4.0 { 1.0 - d / 5.0 } else { 0.0 };
                MotionSample::new(
                    t0 + i * PERIOD_MS,
                    -2.5 * bump,
                    [0.2 + 0.6 * bump, -0.3 + 0.5 * bump, -0.9 + 0.7 * bump],
                )
            })
            .collect()
    }

    /// Helper: arms at rest.
    fn rest(t0: u64, n: u64) -> Vec<MotionSample> {
        (0..n)
            .map(|i| MotionSample::new(t0 + i * PERIOD_MS, 0.0, [0.2, -0.3, -0.9]))
            .collect()
    }

    /// Helper: `reps` cycles, each followed by enough rest to flush the buffer.
    fn session(reps: u64) -> Vec<MotionSample> {
        let mut samples = Vec::new();
        let mut t = 0;
        for _ in 0..reps {
            samples.extend(rep_cycle(t));
            t += 30 * PERIOD_MS;
            samples.extend(rest(t, 120));
            t += 120 * PERIOD_MS;
        }
        samples
    }

    fn count_events(counter: &mut RepCounter, samples: &[MotionSample]) -> Vec<u64> {
        samples
            .iter()
            .filter_map(|s| counter.ingest(s).unwrap())
            .map(|e| e.count)
            .collect()
    }

    #[test]
    fn test_single_rep_counts_exactly_once() {
        let mut counter = RepCounter::default();
        let events = count_events(&mut counter, &rep_cycle(0));
        assert_eq!(events, vec![1]);
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_second_cycle_after_latch_clears() {
        let mut counter = RepCounter::default();

        count_events(&mut counter, &rep_cycle(0));
        assert_eq!(counter.count(), 1);

        count_events(&mut counter, &rest(30 * PERIOD_MS, 120));
        assert!(!counter.is_latched(), "latch should clear once the rep leaves the buffer");
        assert_eq!(counter.count(), 1);

        let events = count_events(&mut counter, &rep_cycle(150 * PERIOD_MS));
        assert_eq!(events, vec![2]);
    }

    #[test]
    fn test_set_of_reps_refined() {
        let mut counter = RepCounter::default();
        let events = count_events(&mut counter, &session(8));
        assert_eq!(events, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn test_set_of_reps_raw() {
        let mut config = RepCounterConfig::raw();
        config.thresholds.gravity_x = ThresholdRule::Fixed { value: 0.5 };
        config.thresholds.gravity_y = ThresholdRule::Fixed { value: 0.0 };
        config.thresholds.gravity_z = ThresholdRule::Fixed { value: -0.5 };
        let mut counter = RepCounter::new(config).unwrap();
        let events = count_events(&mut counter, &session(5));
        assert_eq!(events, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_release_immediately_policy_counts_set() {
        let mut config = RepCounterConfig::default();
        config.debounce_policy = DebouncePolicy::ReleaseImmediately;
        let mut counter = RepCounter::new(config).unwrap();
        assert_eq!(count_events(&mut counter, &session(4)).len(), 4);
    }

    #[test]
    fn test_sustained_pose_counts_once() {
        // Hold the top of the raise: the qualifying features stay in the
        // buffer for many consecutive samples.
        let mut counter = RepCounter::default();
        let mut samples = rep_cycle(0);
        samples.extend(rest(30 * PERIOD_MS, 40));

        let mut latched_after_first = 0;
        for s in &samples {
            counter.ingest(s).unwrap();
            if counter.count() == 1 && counter.is_latched() {
                latched_after_first += 1;
            }
        }
        assert_eq!(counter.count(), 1);
        assert!(latched_after_first > 10);
    }

    #[test]
    fn test_reset_clears_latch_not_just_count() {
        let mut counter = RepCounter::default();
        count_events(&mut counter, &rep_cycle(0));
        assert!(counter.is_latched());

        counter.reset();
        assert_eq!(counter.count(), 0);
        assert!(!counter.is_latched());

        // The rep is still in the buffer, so the very next cycle re-triggers
        let events = count_events(&mut counter, &rest(30 * PERIOD_MS, 1));
        assert_eq!(events, vec![1]);
    }

    #[test]
    fn test_reset_then_fresh_rep() {
        let mut counter = RepCounter::default();
        count_events(&mut counter, &session(3));
        assert_eq!(counter.count(), 3);

        counter.reset();
        let t0 = 3 * 150 * PERIOD_MS;
        let events = count_events(&mut counter, &rep_cycle(t0));
        assert_eq!(events, vec![1]);
    }

    #[test]
    fn test_rotation_only_is_not_a_rep() {
        let mut counter = RepCounter::default();
        let samples: Vec<MotionSample> = rep_cycle(0)
            .into_iter()
            .map(|mut s| {
                s.gravity = [0.2, -0.3, -0.9];
                s
            })
            .collect();
        assert!(count_events(&mut counter, &samples).is_empty());
    }

    #[test]
    fn test_gravity_only_is_not_a_rep() {
        let mut counter = RepCounter::default();
        let samples: Vec<MotionSample> = rep_cycle(0)
            .into_iter()
            .map(|mut s| {
                s.rotation_y = 0.0;
                s
            })
            .collect();
        assert!(count_events(&mut counter, &samples).is_empty());
    }

    #[test]
    fn test_rotation_peak_instead_of_trough_is_not_a_rep() {
        let mut counter = RepCounter::default();
        let samples: Vec<MotionSample> = rep_cycle(0)
            .into_iter()
            .map(|mut s| {
                s.rotation_y = -s.rotation_y;
                s
            })
            .collect();
        assert!(count_events(&mut counter, &samples).is_empty());
    }

    #[test]
    fn test_observers_see_every_rep_and_reset() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let resets = Arc::new(Mutex::new(0u32));

        let mut counter = RepCounter::default();
        let sink = Arc::clone(&seen);
        counter.on_rep(move |e| sink.lock().unwrap().push(*e));
        let r = Arc::clone(&resets);
        counter.on_reset(move || *r.lock().unwrap() += 1);

        count_events(&mut counter, &session(3));
        counter.reset();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.iter().map(|e| e.count).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(seen.iter().all(|e| e.trough_ms.is_some()));
        for event in seen.iter() {
            let trough = event.trough_ms.unwrap_or_default();
            assert!(event.peaks_ms.iter().all(|p| p.abs_diff(trough) < 500));
        }
        assert!(seen.windows(2).all(|w| w[0].timestamp_ms < w[1].timestamp_ms));
        assert_eq!(*resets.lock().unwrap(), 1);
    }

    #[test]
    fn test_rejected_samples_do_not_disturb_session() {
        let mut counter = RepCounter::default();
        let mut accepted = 0;
        for (i, s) in session(2).iter().enumerate() {
            if i % 17 == 0 {
                let bad = MotionSample::new(s.timestamp_ms, 0.0, [f64::NAN, 0.0, 0.0]);
                assert!(counter.ingest(&bad).is_err());
            }
            counter.ingest(s).unwrap();
            accepted += 1;
        }
        assert_eq!(counter.count(), 2);
        assert_eq!(counter.samples_seen(), accepted);
    }

    #[test]
    fn test_shared_counter_session() {
        let shared = SharedRepCounter::new(RepCounter::default());
        let feeder = shared.clone();
        std::thread::spawn(move || {
            for s in session(3) {
                feeder.ingest(&s).unwrap();
            }
        })
        .join()
        .unwrap();
        assert_eq!(shared.count(), 3);
        shared.reset();
        assert_eq!(shared.count(), 0);
    }
}
