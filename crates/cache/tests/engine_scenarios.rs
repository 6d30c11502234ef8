//! End-to-end scenarios for the size-aware S3-FIFO engine.
//!
//! Every scenario runs with the probabilistic admission draw disabled
//! (or replaced by the hard regime) so the traces are deterministic.

use pretty_assertions::assert_eq;
use strata_cache::{Cache, Request, S3FifoSize, S3FifoSizeParams, SmallAdmission};

fn req(id: u64, size: u64) -> Request {
    Request::new(id, size)
}

fn engine(capacity: u64, spec: &str, admission: SmallAdmission) -> S3FifoSize {
    let mut params = S3FifoSizeParams::parse(spec).unwrap();
    params.admission = admission;
    S3FifoSize::from_params(capacity, params)
}

#[test]
fn test_single_object_warms_up_in_small() {
    let mut cache = engine(1000, "", SmallAdmission::Disabled);

    assert!(!cache.get(&req(1, 100)));
    assert!(cache.get(&req(1, 100)));
    assert!(cache.get(&req(1, 100)));

    assert_eq!(cache.stats().n_miss, 1);
    assert_eq!(cache.stats().n_hit, 2);
    assert!(cache.small().contains(1));
    assert_eq!(cache.small().object(1).unwrap().freq, 3);
    assert_eq!(cache.occupied_bytes(), 100);
    assert_eq!(cache.n_objects(), 1);
}

#[test]
fn test_initial_fill_saturates_main_through_warm_up() {
    let mut cache = engine(1000, "", SmallAdmission::Disabled);

    // 20 distinct ids of size 50 fill the cache exactly, with no
    // eviction: the first two land in small, the rest overflow into
    // main while the engine has never evicted.
    for id in 1..=20 {
        assert!(!cache.get(&req(id, 50)));
    }

    assert_eq!(cache.stats().n_miss, 20);
    assert_eq!(cache.small().occupied_bytes(), 100);
    assert_eq!(cache.main().occupied_bytes(), 900);
    assert_eq!(cache.occupied_bytes(), 1000);
    assert_eq!(cache.stats().n_obj_admit_to_small, 2);
    assert_eq!(cache.stats().n_obj_admit_to_main, 18);
    // Nothing was demoted during the fill.
    assert_eq!(cache.ghost().unwrap().n_objects(), 0);
}

#[test]
fn test_warm_object_promotes_to_main_on_small_eviction() {
    let mut cache = engine(1000, "", SmallAdmission::Disabled);

    // Warm id 1 up in the small queue.
    cache.get(&req(1, 50));
    cache.get(&req(1, 50));
    cache.get(&req(1, 50));
    assert_eq!(cache.small().object(1).unwrap().freq, 3);

    // 20 distinct ids fill the cache and then force an eviction round;
    // id 1 has freq 3 by then, so it promotes instead of demoting.
    for id in 2..=21 {
        assert!(!cache.get(&req(id, 50)));
    }

    assert_eq!(cache.stats().n_obj_move_to_main, 1);
    assert_eq!(cache.stats().n_bytes_move_to_main, 50);
    assert!(cache.main().contains(1));
    assert!(!cache.ghost().unwrap().contains(1));

    // The promoted object is still a hit.
    assert!(cache.get(&req(1, 50)));
    assert_eq!(cache.stats().n_hit, 3);
    assert_eq!(cache.stats().n_miss, 21);
}

#[test]
fn test_hard_admission_rejects_oversized_candidate() {
    let mut cache = engine(1000, "", SmallAdmission::Hard);

    // 950 >= small capacity (100), and the id was never in the ghost,
    // so admission fails: a miss with no state change.
    assert!(!cache.get(&req(1, 950)));
    assert_eq!(cache.n_objects(), 0);
    assert_eq!(cache.occupied_bytes(), 0);
    assert_eq!(cache.stats().n_miss, 1);
}

#[test]
fn test_cold_object_demotes_to_ghost_and_keeps_frequency() {
    // All-small geometry with a raised promotion threshold: freq-1
    // victims demote, freq-2 victims promote (and then fall straight
    // through the zero-capacity main queue).
    let mut cache = engine(
        100,
        "small-size-ratio=1.0,move-to-main-threshold=2",
        SmallAdmission::Disabled,
    );

    cache.get(&req(1, 50)); // A
    cache.get(&req(2, 50)); // B
    assert!(cache.get(&req(1, 50))); // A again: freq 2
    assert_eq!(cache.stats().n_miss, 2);
    assert_eq!(cache.stats().n_hit, 1);

    // C forces an eviction: A (freq 2) promotes, but main has zero
    // capacity so it recirculates once and drops.
    cache.get(&req(3, 50));
    assert_eq!(cache.stats().n_obj_move_to_main, 1);
    assert!(cache.find(&req(1, 50), false).is_none());
    assert!(!cache.ghost().unwrap().contains(1));

    // D forces the next eviction: B (freq 1) fails the threshold and
    // demotes to the ghost with its frequency preserved.
    cache.get(&req(4, 50));
    let ghost = cache.ghost().unwrap();
    assert!(ghost.contains(2));
    assert_eq!(ghost.object(2).unwrap().freq, 1);
    assert!(cache.find(&req(2, 50), false).is_none());
}

#[test]
fn test_ghost_readmission_into_small_bumps_frequency() {
    let mut cache = engine(
        100,
        "small-size-ratio=1.0,move-to-main-threshold=2",
        SmallAdmission::Disabled,
    );

    // Same prefix as above: B ends up in the ghost with freq 1.
    cache.get(&req(1, 50));
    cache.get(&req(2, 50));
    cache.get(&req(1, 50));
    cache.get(&req(3, 50));
    cache.get(&req(4, 50));
    assert!(cache.ghost().unwrap().contains(2));

    // Readmitting B: freq 1 against ratio 1 stays below the threshold,
    // so B re-enters the small queue carrying its ghost history.
    assert!(!cache.get(&req(2, 50)));
    assert!(cache.small().contains(2));
    assert_eq!(cache.small().object(2).unwrap().freq, 2);
    assert!(!cache.ghost().unwrap().contains(2));
}

#[test]
fn test_ghost_readmission_clears_threshold_into_main() {
    let mut cache = engine(1000, "", SmallAdmission::Disabled);

    // Two 90-byte objects fill small past its capacity, then 82
    // 10-byte objects warm-fill main to 820 bytes.
    cache.get(&req(1, 90)); // A
    cache.get(&req(2, 90)); // B
    for id in 100..182 {
        cache.get(&req(id, 10));
    }
    assert_eq!(cache.occupied_bytes(), 1000);

    // X forces an eviction round: A (freq 1, much larger than the mean
    // object) demotes to the ghost.
    cache.get(&req(3, 90)); // X
    assert!(cache.ghost().unwrap().contains(1));

    // Readmitting A: the small queue's mean object size is now 90, so
    // A's normalized frequency clears the threshold and it is admitted
    // straight into main.
    assert!(!cache.get(&req(1, 90)));
    assert!(cache.main().contains(1));
    assert_eq!(cache.main().object(1).unwrap().freq, 1);
    assert!(!cache.ghost().unwrap().contains(1));
}

#[test]
fn test_user_removal_empties_the_cache() {
    let mut cache = engine(1000, "", SmallAdmission::Disabled);

    for id in 1..=20 {
        cache.get(&req(id, 50));
    }
    assert_eq!(cache.occupied_bytes(), 1000);

    for id in 1..=20 {
        assert!(cache.remove(id), "id {id} should be resident");
    }
    assert_eq!(cache.occupied_bytes(), 0);
    assert_eq!(cache.n_objects(), 0);
    assert!(!cache.remove(1));
}

#[test]
fn test_removal_also_clears_ghost_entries() {
    let mut cache = engine(
        100,
        "small-size-ratio=1.0,move-to-main-threshold=2",
        SmallAdmission::Disabled,
    );

    cache.get(&req(1, 50));
    cache.get(&req(2, 50));
    cache.get(&req(3, 50)); // demotes 1 (freq 1) into the ghost
    assert!(cache.ghost().unwrap().contains(1));

    assert!(cache.remove(1));
    assert!(!cache.ghost().unwrap().contains(1));
    assert!(!cache.remove(1));
}

#[test]
fn test_ghost_never_overlaps_residents_under_churn() {
    let mut cache = engine(400, "move-to-main-threshold=2", SmallAdmission::Hard);

    // A repeating mix of sizes drives admissions, demotions, and
    // readmissions through the ghost.
    for step in 0u64..600 {
        let id = step % 23;
        let size = 10 + (id % 4) * 9;
        cache.get(&req(id, size));

        assert!(cache.occupied_bytes() <= cache.capacity());
        if let Some(ghost) = cache.ghost() {
            for entry in ghost.objects() {
                assert!(
                    !cache.small().contains(entry.obj_id)
                        && !cache.main().contains(entry.obj_id),
                    "ghost id {} is also resident",
                    entry.obj_id
                );
            }
        }
    }
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let params = S3FifoSizeParams::default(); // probabilistic admission
    let mut first = S3FifoSize::with_seed(1000, params, 7);
    let mut second = S3FifoSize::with_seed(1000, params, 7);

    for step in 0u64..2000 {
        let id = (step * 7 + step / 3) % 67;
        let size = 5 + (step * 13) % 140;
        assert_eq!(first.get(&req(id, size)), second.get(&req(id, size)));
    }

    assert_eq!(first.stats(), second.stats());

    let residents = |cache: &S3FifoSize| {
        let mut ids: Vec<u64> = cache
            .small()
            .objects()
            .chain(cache.main().objects())
            .map(|obj| obj.obj_id)
            .collect();
        ids.sort_unstable();
        ids
    };
    assert_eq!(residents(&first), residents(&second));
}
