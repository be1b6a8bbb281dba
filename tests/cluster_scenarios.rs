mod common;

use common::{
    aligner, aligner_with_policy, config, pair_of_len, tracker, ScriptedEngine, ScriptedSingle,
};
use linkalign::genomics::{AlignmentStatus, Direction, GenomeLocation};
use linkalign::{
    BarcodeStatus, DensestWindow, FixedTarget, PairStage, ProgressTracker, StageLedger,
};
use test_case::test_case;

#[test]
fn both_mates_too_short_resolve_without_search() {
    let mut aligner = aligner(config(), ScriptedSingle::new(60));
    let mut trackers = vec![ProgressTracker::new(
        pair_of_len("tiny", 0, 0),
        ScriptedEngine::concordant(1_000),
        4,
        4,
    )];

    let status = aligner.align(&mut trackers).expect("align succeeds");

    assert_eq!(status, BarcodeStatus::Finished);
    let tracker = &trackers[0];
    assert_eq!(tracker.stage(), PairStage::Resolved);
    assert_eq!(tracker.engine().searches, 0);
    let result = tracker.result();
    assert_eq!(result.status, [AlignmentStatus::NotFound; 2]);
    assert_eq!(result.mapq, [0, 0]);
    assert_eq!(result.score, [0, 0]);
    assert_eq!(result.location, [GenomeLocation::new(0); 2]);
    assert!(!result.aligned_as_pair);
    assert!(aligner.single_aligner().aligned.is_empty());
}

#[test]
fn chimera_is_deferred_then_resolved_on_next_call() {
    let mut aligner = aligner(config(), ScriptedSingle::new(60));
    let mut trackers = vec![
        tracker("a", ScriptedEngine::concordant(1_000)),
        tracker("b", ScriptedEngine::chimeric(1_200)),
    ];

    let first = aligner.align(&mut trackers).expect("first call");
    assert_eq!(first, BarcodeStatus::Pending);
    assert_eq!(trackers[0].stage(), PairStage::Resolved);
    assert_eq!(trackers[1].stage(), PairStage::SingleFallback);
    assert!(trackers[0].result().aligned_as_pair);
    assert!(trackers[0].result().from_align_together);
    assert!(aligner.single_aligner().aligned.is_empty());

    let second = aligner.align(&mut trackers).expect("second call");
    assert_eq!(second, BarcodeStatus::Finished);

    let b = &trackers[1];
    assert_eq!(b.stage(), PairStage::Resolved);
    assert_eq!(b.result().status, [AlignmentStatus::Found; 2]);
    assert_eq!(b.result().mapq, [20, 20]);
    assert!(!b.result().aligned_as_pair);
    assert!(!b.result().from_align_together);
    for t in &trackers {
        assert_eq!(t.searches(), 1);
        assert_eq!(t.engine().searches, 1);
    }
}

#[test_case(60, 20; "sixty")]
#[test_case(59, 19; "rounds down")]
#[test_case(70, 23; "max mapq")]
#[test_case(2, 0; "below divisor")]
fn fallback_divides_mapq_by_three(single_mapq: u8, expected: u8) {
    let mut aligner = aligner(config(), ScriptedSingle::new(single_mapq));
    let mut trackers = vec![tracker("c", ScriptedEngine::chimeric(7_000))];

    assert_eq!(aligner.align(&mut trackers).unwrap(), BarcodeStatus::Pending);
    assert_eq!(aligner.align(&mut trackers).unwrap(), BarcodeStatus::Finished);

    assert_eq!(trackers[0].result().mapq, [expected, expected]);
}

#[test]
fn forced_spacing_never_falls_back() {
    let mut aligner = aligner(config().with_force_spacing(true), ScriptedSingle::new(60));
    let mut lost_first_mate = ScriptedEngine::chimeric(3_000);
    lost_first_mate.found = [false, true];
    let mut trackers = vec![
        tracker("pair", ScriptedEngine::concordant(1_000)),
        tracker("chimera", ScriptedEngine::chimeric(2_000)),
        tracker("lost", lost_first_mate),
        tracker("empty", ScriptedEngine::empty()),
        ProgressTracker::new(
            pair_of_len("short", 100, 5),
            ScriptedEngine::concordant(4_000),
            4,
            4,
        ),
    ];

    let status = aligner.align(&mut trackers).expect("align succeeds");

    assert_eq!(status, BarcodeStatus::Finished);
    assert!(trackers.iter().all(ProgressTracker::is_resolved));
    assert!(aligner.single_aligner().aligned.is_empty());

    // Mate 0 found: reported as a pair even though mate 1 is missing.
    let chimera = trackers[1].result();
    assert!(chimera.aligned_as_pair);
    assert_eq!(chimera.status, [AlignmentStatus::Found, AlignmentStatus::NotFound]);

    let lost = trackers[2].result();
    assert!(!lost.aligned_as_pair);
    assert!(!lost.from_align_together);

    assert_eq!(trackers[3].result().status, [AlignmentStatus::NotFound; 2]);
    assert_eq!(trackers[4].engine().searches, 0);
}

#[test]
fn scored_pairs_are_finalized_or_deferred_never_both() {
    let mut aligner = aligner(config(), ScriptedSingle::new(60));
    let mut trackers = vec![
        tracker("p0", ScriptedEngine::concordant(100)),
        tracker("p1", ScriptedEngine::chimeric(200)),
        tracker("p2", ScriptedEngine::concordant(300)),
        tracker("p3", ScriptedEngine::empty()),
        tracker("p4", ScriptedEngine::chimeric(500)),
    ];

    aligner.align(&mut trackers).expect("align succeeds");

    for tracker in trackers.iter().filter(|t| t.engine().scores > 0) {
        let finalized = tracker.stage() == PairStage::Resolved;
        let deferred = tracker.stage() == PairStage::SingleFallback;
        assert!(
            finalized ^ deferred,
            "pair {} in {:?}",
            tracker.pair().id,
            tracker.stage()
        );
    }
    let ledger = StageLedger::from_trackers(&trackers);
    assert_eq!(ledger.indices(PairStage::Resolved), vec![0, 2]);
    assert_eq!(ledger.indices(PairStage::SingleFallback), vec![1, 3, 4]);
}

#[test]
fn one_short_mate_goes_straight_to_fallback() {
    let mut aligner = aligner(config(), ScriptedSingle::new(45));
    let mut trackers = vec![ProgressTracker::new(
        pair_of_len("half", 100, 10),
        ScriptedEngine::concordant(1_000),
        4,
        4,
    )];

    let status = aligner.align(&mut trackers).expect("align succeeds");

    assert_eq!(status, BarcodeStatus::Finished);
    let tracker = &trackers[0];
    assert_eq!(tracker.engine().searches, 0);
    let result = tracker.result();
    assert_eq!(result.status, [AlignmentStatus::Found, AlignmentStatus::NotFound]);
    assert_eq!(result.mapq, [15, 0]);
    assert_eq!(result.direction[1], Direction::Forward);
    assert_eq!(result.location[1], GenomeLocation::new(0));
    assert_eq!(aligner.single_aligner().calls_for("half/2"), 0);
}

#[test]
fn empty_search_falls_back_in_same_call() {
    let mut aligner = aligner(config(), ScriptedSingle::new(30));
    let mut trackers = vec![tracker("nothing", ScriptedEngine::empty())];

    let status = aligner.align(&mut trackers).expect("align succeeds");

    assert_eq!(status, BarcodeStatus::Finished);
    assert_eq!(trackers[0].engine().scores, 0);
    assert_eq!(trackers[0].result().mapq, [10, 10]);
    assert!(!trackers[0].result().from_align_together);
}

#[test]
fn search_is_biased_toward_densest_anchors() {
    let policy = DensestWindow::new(100_000, 2);
    let mut aligner = aligner_with_policy(config(), ScriptedSingle::new(60), policy);
    let mut trackers = vec![
        tracker("near0", ScriptedEngine::concordant(1_200)),
        tracker("near1", ScriptedEngine::concordant(1_000)),
        tracker("far", ScriptedEngine::concordant(900_000)),
    ];

    aligner.align(&mut trackers).expect("align succeeds");

    for tracker in &trackers {
        assert_eq!(tracker.engine().targets, vec![GenomeLocation::new(1_000)]);
    }
}

#[test]
fn no_target_without_support() {
    let policy = DensestWindow::new(100, 2);
    let mut aligner = aligner_with_policy(config(), ScriptedSingle::new(60), policy);
    let mut trackers = vec![
        tracker("x", ScriptedEngine::concordant(1_000)),
        tracker("y", ScriptedEngine::concordant(50_000)),
    ];

    aligner.align(&mut trackers).expect("align succeeds");

    assert!(trackers.iter().all(|t| t.engine().targets.is_empty()));
}

#[test]
fn cache_is_shared_across_the_barcode() {
    let target = FixedTarget(GenomeLocation::new(42));
    let mut aligner = aligner_with_policy(config(), ScriptedSingle::new(60), target);
    let mut trackers = vec![
        tracker("a", ScriptedEngine::concordant(1_000)),
        tracker("b", ScriptedEngine::chimeric(1_100)),
    ];

    aligner.align(&mut trackers).expect("first call");
    // Two searches plus two scorings.
    assert_eq!(aligner.cache().touches, 4);
    aligner.align(&mut trackers).expect("second call");
    // Plus two single-end alignments for the chimera.
    assert_eq!(aligner.cache().touches, 6);
}

#[test]
fn resolved_barcode_is_idempotent() {
    let mut aligner = aligner(config(), ScriptedSingle::new(60));
    let mut trackers = vec![tracker("done", ScriptedEngine::concordant(1_000))];

    assert_eq!(aligner.align(&mut trackers).unwrap(), BarcodeStatus::Finished);
    let before = *trackers[0].result();
    assert_eq!(aligner.align(&mut trackers).unwrap(), BarcodeStatus::Finished);

    assert_eq!(*trackers[0].result(), before);
    assert_eq!(trackers[0].engine().searches, 1);
    assert_eq!(trackers[0].engine().scores, 1);
}

#[test]
fn reset_tracker_starts_over_with_grown_buffers() {
    let mut aligner = aligner(config(), ScriptedSingle::new(60));
    let mut trackers = vec![tracker("first", ScriptedEngine::concordant(1_000))];
    trackers[0].grow_paired_secondary(16);

    aligner.align(&mut trackers).expect("align succeeds");
    trackers[0].reset(pair_of_len("second", 80, 80));

    assert_eq!(trackers[0].stage(), PairStage::PairSearching);
    assert_eq!(trackers[0].searches(), 0);
    assert_eq!(trackers[0].paired_secondary().capacity(), 16);
    assert_eq!(&*trackers[0].pair().id, "second");
}

#[test_case(29, 0; "one below minimum")]
#[test_case(30, 1; "at minimum")]
#[test_case(31, 1; "above minimum")]
fn minimum_length_is_inclusive(len: usize, searches: u32) {
    let mut aligner = aligner(config(), ScriptedSingle::new(60));
    let mut trackers = vec![ProgressTracker::new(
        pair_of_len("edge", len, len),
        ScriptedEngine::concordant(1_000),
        4,
        4,
    )];

    aligner.align(&mut trackers).expect("align succeeds");

    assert_eq!(trackers[0].engine().searches, searches);
}

#[test]
fn anchorless_cursors_leave_search_unbiased() {
    let policy = DensestWindow {
        max_span: 10,
        min_support: 0,
    };
    let mut aligner = aligner_with_policy(config(), ScriptedSingle::new(60), policy);
    let mut hidden = ScriptedEngine::concordant(1_000);
    hidden.reports_anchor = false;
    let mut trackers = vec![tracker("hidden", hidden)];

    let status = aligner.align(&mut trackers).expect("align succeeds");

    assert_eq!(status, BarcodeStatus::Finished);
    assert!(trackers[0].engine().targets.is_empty());
}

#[test]
fn resolved_pairs_anchor_a_restarted_search() {
    let policy = DensestWindow::new(1_000, 2);
    let mut aligner = aligner_with_policy(config(), ScriptedSingle::new(60), policy);
    let mut trackers = vec![
        tracker("a", ScriptedEngine::concordant(1_000)),
        tracker("b", ScriptedEngine::concordant(1_100)),
    ];
    assert_eq!(aligner.align(&mut trackers).unwrap(), BarcodeStatus::Finished);

    // The new pair's own cursor is far away; only pair a's found mates
    // (1_000 and 1_300) give the window its support.
    trackers[1].engine_mut().location = 60_000;
    trackers[1].reset(pair_of_len("b2", 100, 100));
    assert_eq!(aligner.align(&mut trackers).unwrap(), BarcodeStatus::Finished);

    assert_eq!(trackers[0].engine().targets, vec![GenomeLocation::new(1_000)]);
    assert_eq!(
        trackers[1].engine().targets,
        vec![GenomeLocation::new(1_000), GenomeLocation::new(1_000)]
    );
    assert_eq!(trackers[1].engine().searches, 2);
}
