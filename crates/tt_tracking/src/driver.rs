use std::collections::BTreeMap;

use glam::Vec2;
use itertools::Itertools as _;

use tt_geometry::{Homography, point_in_convex_quad, quad_is_convex};
use tt_tracker::{
    COORD_LIMIT, N_GRID, PlanarTracker, PointStore, TrackState, generate_grid,
};
use tt_types::{FrameNr, PointId, TrackerId};
use tt_vision::{FlowParams, GrayImage, HomographyParams, ImagePyramid, VisionBackend};

use crate::TrackerContext;

/// Feature points at or below this confidence are not trusted for
/// homography estimation; homography fits below this inlier fraction are
/// discarded.
pub const CONFIDENCE_FLOOR: f32 = 0.3;

/// A planar update needs at least this many usable point pairs; below it
/// the grid regenerates instead.
pub const MIN_FEATURES: usize = 15;

/// Regenerated grid points keep this distance (pixels) from preserved ones.
pub const MIN_FEATURE_SPACING: f32 = 20.0;

/// Consecutive homography failures before a tracker is declared lost.
pub const LOST_AFTER_STRIKES: u32 = 3;

/// Per-axis displacement below which a point pair counts as static.
const IDENTICAL_EPS: f32 = 0.1;

/// Why a planar update was skipped. These are local conditions: the tracker
/// holds its last good quad and the driver moves on.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq)]
pub enum UpdateFailure {
    #[error("homography estimation returned no model")]
    EstimationFailed,

    #[error("inlier fraction {fraction:.2} is below the confidence floor")]
    ConfidenceTooLow { fraction: f32 },

    #[error("transformed corners were non-finite, out of range, or non-convex")]
    DegenerateTransform,

    #[error("only {available} usable feature points")]
    InsufficientFeatures { available: usize },
}

/// What happened to one planar tracker during [`advance_frame`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlanarOutcome {
    /// A fresh homography moved the corners.
    Tracked { inlier_fraction: f32 },

    /// Every pair was static (typical right after a scrub); an identity
    /// homography was recorded and the quad stayed put.
    Identity,

    /// The feature grid was rebuilt; no homography this frame.
    Regenerated { preserved: usize, seeded: usize },

    /// The update was skipped and the tracker left untouched.
    Skipped(UpdateFailure),

    /// This frame's failure crossed the strike limit; the tracker is out of
    /// the automatic loop until a manual adjustment revives it.
    Lost(UpdateFailure),
}

/// Summary of one [`advance_frame`] call.
#[derive(Clone, Debug, Default)]
pub struct FrameReport {
    pub frame: FrameNr,
    pub points_tracked: usize,
    pub points_lost: usize,
    pub planar: Vec<(TrackerId, PlanarOutcome)>,
}

/// Advances the whole context from frame `f_new - 1` to `f_new`.
///
/// Every active point is flowed first, so that the planar updates read the
/// already-committed positions of the new frame. Point histories and
/// trajectories for `f_new` are fully written before this function returns;
/// no reader ever observes a half-advanced frame.
pub fn advance_frame(
    ctx: &mut TrackerContext,
    vision: &dyn VisionBackend,
    prev: &ImagePyramid,
    curr: &ImagePyramid,
    f_new: FrameNr,
) -> FrameReport {
    let f_prev = f_new.prev();
    let mut report = FrameReport {
        frame: f_new,
        ..Default::default()
    };

    track_points(ctx, vision, prev, curr, f_prev, f_new, &mut report);

    let TrackerContext {
        points, planars, ..
    } = ctx;
    for tracker in planars.iter_mut() {
        if !tracker.active || tracker.state == TrackState::Lost {
            continue;
        }
        let outcome = update_planar(points, tracker, vision, curr.finest(), f_prev, f_new);
        match &outcome {
            PlanarOutcome::Skipped(failure) | PlanarOutcome::Lost(failure) => {
                tt_log::debug!("{}: update failed at {f_new}: {failure}", tracker.id);
            }
            _ => {}
        }
        report.planar.push((tracker.id, outcome));
    }

    report
}

/// Flows every active point from `f_prev` to `f_new` and commits the
/// results. Points are batched by window size so each batch is one backend
/// call; batches and points within them are visited in deterministic order.
fn track_points(
    ctx: &mut TrackerContext,
    vision: &dyn VisionBackend,
    prev: &ImagePyramid,
    curr: &ImagePyramid,
    f_prev: FrameNr,
    f_new: FrameNr,
    report: &mut FrameReport,
) {
    let mut by_window: BTreeMap<u32, Vec<PointId>> = BTreeMap::new();
    for point in ctx.points.iter().filter(|p| p.active) {
        by_window
            .entry(point.adaptive_window_size)
            .or_default()
            .push(point.id);
    }

    for (window_size, ids) in by_window {
        let starts = ids
            .iter()
            .map(|&id| {
                ctx.points
                    .get(id)
                    .expect("active id collected above")
                    .position_at(f_prev)
            })
            .collect_vec();

        let params = FlowParams {
            window_size,
            ..FlowParams::default()
        };
        let statuses = vision.pyramidal_lk(prev, curr, &starts, &params);

        for ((&id, &start), status) in ids.iter().zip(&starts).zip(statuses) {
            let Some(point) = ctx.points.get_mut(id) else {
                continue;
            };

            let within_reach = status.pos.distance(start) <= point.search_radius;
            if status.tracked && within_reach {
                point.confidence = status.confidence.clamp(0.0, 1.0);
                ctx.points.commit(id, f_new, status.pos);
                report.points_tracked += 1;
            } else {
                // Lost: keep the history, stop tracking.
                point.active = false;
                point.confidence = 0.0;
                report.points_lost += 1;
            }
        }
    }
}

fn update_planar(
    points: &mut PointStore,
    tracker: &mut PlanarTracker,
    vision: &dyn VisionBackend,
    gray: &GrayImage,
    f_prev: FrameNr,
    f_new: FrameNr,
) -> PlanarOutcome {
    // A manual edit moved the quad; the old grid no longer describes it.
    // Rebuild and let the next frame track from the edited prior.
    if tracker.needs_feature_regen {
        let (preserved, seeded) = regenerate_features(points, tracker, Some(gray), f_new);
        return PlanarOutcome::Regenerated { preserved, seeded };
    }

    // 1. Usable point pairs: active, trusted, and tracked into this frame.
    let mut prev_pts = Vec::with_capacity(tracker.feature_points.len());
    let mut curr_pts = Vec::with_capacity(tracker.feature_points.len());
    for &point_id in &tracker.feature_points {
        let Some(point) = points.get(point_id) else {
            continue;
        };
        if !point.active || point.confidence <= CONFIDENCE_FLOOR {
            continue;
        }
        let Some(&new_pos) = point.frame_positions.get(&f_new) else {
            continue;
        };
        prev_pts.push(point.position_at(f_prev));
        curr_pts.push(new_pos);
    }

    // 2. Not enough pairs: regenerate instead of estimating from noise.
    if prev_pts.len() < MIN_FEATURES {
        let available = prev_pts.len();
        let (preserved, seeded) = regenerate_features(points, tracker, Some(gray), f_new);
        if tracker.state == TrackState::Tracking {
            tracker.state = TrackState::Degraded;
        }
        tt_log::debug!(
            "{}: {}; regenerated ({preserved} preserved, {seeded} new)",
            tracker.id,
            UpdateFailure::InsufficientFeatures { available },
        );
        return PlanarOutcome::Regenerated { preserved, seeded };
    }

    // 3. All pairs static; typical right after a scrub, when the "previous"
    // and "current" positions come from the same committed history.
    let identical = prev_pts
        .iter()
        .zip(&curr_pts)
        .all(|(a, b)| (a.x - b.x).abs() < IDENTICAL_EPS && (a.y - b.y).abs() < IDENTICAL_EPS);
    if identical {
        tracker.homography = Some(Homography::IDENTITY);
        tracker.frame_homographies.insert(f_new, Homography::IDENTITY);
        tracker.record_frame(f_new);
        tracker.confidence = 1.0;
        tracker.state = TrackState::Tracking;
        tracker.strikes = 0;
        return PlanarOutcome::Identity;
    }

    // 4. Robust fit.
    let Some(fit) = vision.find_homography(&prev_pts, &curr_pts, &HomographyParams::default())
    else {
        return strike(tracker, UpdateFailure::EstimationFailed);
    };

    // 5. Too few of the pairs agree with the model.
    let inlier_fraction = fit.inlier_fraction();
    if inlier_fraction < CONFIDENCE_FLOOR {
        return strike(
            tracker,
            UpdateFailure::ConfidenceTooLow {
                fraction: inlier_fraction,
            },
        );
    }

    // 6. Propagate incrementally onto the current corners.
    let quad = tracker.quad();
    let new_quad = quad.map(|corner| fit.homography.apply_pt(corner));
    let in_range = new_quad
        .iter()
        .all(|c| c.is_finite() && c.x.abs() <= COORD_LIMIT && c.y.abs() <= COORD_LIMIT);
    if !in_range || !quad_is_convex(&new_quad) {
        // Revert: the corners keep their previous values.
        if tracker.state == TrackState::Tracking {
            tracker.state = TrackState::Degraded;
        }
        return strike(tracker, UpdateFailure::DegenerateTransform);
    }

    tracker.set_quad(new_quad);
    tracker.record_frame(f_new);
    tracker.frame_homographies.insert(f_new, fit.homography);
    tracker.homography = Some(fit.homography);
    tracker.confidence = inlier_fraction;
    tracker.state = TrackState::Tracking;
    tracker.strikes = 0;

    PlanarOutcome::Tracked { inlier_fraction }
}

/// Books one homography failure; three in a row lose the tracker.
fn strike(tracker: &mut PlanarTracker, failure: UpdateFailure) -> PlanarOutcome {
    tracker.strikes += 1;
    if tracker.strikes >= LOST_AFTER_STRIKES {
        tracker.state = TrackState::Lost;
        tracker.active = false;
        tt_log::info!("{}: lost after {LOST_AFTER_STRIKES} consecutive failures", tracker.id);
        PlanarOutcome::Lost(failure)
    } else {
        PlanarOutcome::Skipped(failure)
    }
}

/// Seeds a freshly created tracker's feature grid: interior lattice plus the
/// four corners, optionally snapped to nearby texture.
pub fn seed_features(
    points: &mut PointStore,
    tracker: &mut PlanarTracker,
    gray: Option<&GrayImage>,
    frame: FrameNr,
) {
    for &point_id in &tracker.feature_points {
        if let Some(point) = points.get_mut(point_id) {
            point.active = false;
        }
    }

    let quad = tracker.quad();
    let mut feature_points = Vec::with_capacity(N_GRID + 4);
    for candidate in generate_grid(&quad) {
        let (pos, confidence) = snap(gray, candidate);
        feature_points.push(points.create_with_confidence(pos, frame, confidence));
    }

    tracker.feature_points = feature_points;
    tracker.needs_feature_regen = false;
}

/// Rebuilds a tracker's feature grid in place.
///
/// Feature points still inside the quad and above the confidence floor are
/// preserved; the rest are deactivated (their history stays). Fresh grid
/// points are admitted only at [`MIN_FEATURE_SPACING`] from every preserved
/// point, until the grid holds [`N_GRID`] points. Returns
/// `(preserved, seeded)` counts.
pub fn regenerate_features(
    points: &mut PointStore,
    tracker: &mut PlanarTracker,
    gray: Option<&GrayImage>,
    frame: FrameNr,
) -> (usize, usize) {
    let quad = tracker.quad();

    let mut preserved: Vec<PointId> = Vec::new();
    let mut preserved_positions: Vec<Vec2> = Vec::new();
    for &point_id in &tracker.feature_points {
        let Some(point) = points.get(point_id) else {
            continue;
        };
        let pos = point.position_at(frame);
        if point.active
            && point.confidence > CONFIDENCE_FLOOR
            && point_in_convex_quad(pos, &quad)
        {
            preserved.push(point_id);
            preserved_positions.push(pos);
        }
    }

    for &point_id in &tracker.feature_points {
        if !preserved.contains(&point_id) {
            if let Some(point) = points.get_mut(point_id) {
                point.active = false;
            }
        }
    }

    let num_preserved = preserved.len();
    let mut feature_points = preserved;
    for candidate in generate_grid(&quad) {
        if feature_points.len() >= N_GRID {
            break;
        }
        let (pos, confidence) = snap(gray, candidate);
        let far_enough = preserved_positions
            .iter()
            .all(|p| p.distance(pos) > MIN_FEATURE_SPACING);
        if far_enough {
            feature_points.push(points.create_with_confidence(pos, frame, confidence));
        }
    }

    let seeded = feature_points.len() - num_preserved;
    tracker.feature_points = feature_points;
    tracker.needs_feature_regen = false;

    (num_preserved, seeded)
}

fn snap(gray: Option<&GrayImage>, candidate: Vec2) -> (Vec2, f32) {
    match gray {
        Some(gray) => gray.snap_to_gradient(candidate),
        None => (candidate, 1.0),
    }
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tt_vision::{FlowStatus, HomographyFit};

    use super::*;

    /// Scripted backend: constant flow offset, scripted homography answer.
    struct StubVision {
        flow_offset: Vec2,
        homography: StubHomography,
    }

    enum StubHomography {
        Fail,
        Translate(Vec2),
        Blowup,
        LowConfidence,
    }

    impl VisionBackend for StubVision {
        fn pyramidal_lk(
            &self,
            _prev: &ImagePyramid,
            _curr: &ImagePyramid,
            points: &[Vec2],
            _params: &FlowParams,
        ) -> Vec<FlowStatus> {
            points
                .iter()
                .map(|&p| FlowStatus {
                    pos: p + self.flow_offset,
                    tracked: true,
                    confidence: 1.0,
                })
                .collect()
        }

        fn find_homography(
            &self,
            src: &[Vec2],
            _dst: &[Vec2],
            _params: &HomographyParams,
        ) -> Option<HomographyFit> {
            let all_inliers = vec![true; src.len()];
            match self.homography {
                StubHomography::Fail => None,
                StubHomography::Translate(d) => Some(HomographyFit {
                    homography: Homography::from_row_major([
                        1.0, 0.0, d.x, //
                        0.0, 1.0, d.y, //
                        0.0, 0.0, 1.0, //
                    ]),
                    inlier_mask: all_inliers,
                }),
                StubHomography::Blowup => Some(HomographyFit {
                    homography: Homography::from_row_major([
                        1.0e6, 0.0, 0.0, //
                        0.0, 1.0e6, 0.0, //
                        0.0, 0.0, 1.0, //
                    ]),
                    inlier_mask: all_inliers,
                }),
                StubHomography::LowConfidence => {
                    let mut mask = vec![false; src.len()];
                    for flag in mask.iter_mut().take(2) {
                        *flag = true;
                    }
                    Some(HomographyFit {
                        homography: Homography::IDENTITY,
                        inlier_mask: mask,
                    })
                }
            }
        }
    }

    fn pyramid() -> ImagePyramid {
        ImagePyramid::build(GrayImage::new(64, 64), 0)
    }

    fn context_with_tracker() -> (TrackerContext, TrackerId) {
        let mut ctx = TrackerContext::new();
        let id = ctx.create_planar_tracker(
            Vec2::new(100.0, 100.0),
            Vec2::new(640.0, 480.0),
            FrameNr::ZERO,
            None,
        );
        (ctx, id)
    }

    #[test]
    fn creation_seeds_interior_points_and_corners() {
        let (ctx, id) = context_with_tracker();
        let tracker = ctx.planars.get(id).unwrap();
        assert_eq!(tracker.feature_points.len(), N_GRID + 4);
        assert_eq!(ctx.points.len(), N_GRID + 4);
        assert_eq!(tracker.state, TrackState::Idle);
    }

    #[test]
    fn static_pairs_record_an_identity_homography() {
        let (mut ctx, id) = context_with_tracker();
        let vision = StubVision {
            flow_offset: Vec2::ZERO,
            homography: StubHomography::Fail, // must not be consulted
        };

        let report = advance_frame(&mut ctx, &vision, &pyramid(), &pyramid(), FrameNr::new(1));

        assert_eq!(report.planar, vec![(id, PlanarOutcome::Identity)]);
        let tracker = ctx.planars.get(id).unwrap();
        assert_eq!(tracker.homography, Some(Homography::IDENTITY));
        assert_eq!(tracker.confidence, 1.0);
        assert_eq!(tracker.state, TrackState::Tracking);
        assert_eq!(tracker.center, Vec2::new(100.0, 100.0));
        assert!(tracker.trajectory.contains_key(&FrameNr::new(1)));
    }

    #[test]
    fn translation_moves_the_corners() {
        let (mut ctx, id) = context_with_tracker();
        let vision = StubVision {
            flow_offset: Vec2::new(5.0, 0.0),
            homography: StubHomography::Translate(Vec2::new(5.0, 0.0)),
        };

        let report = advance_frame(&mut ctx, &vision, &pyramid(), &pyramid(), FrameNr::new(1));

        assert_eq!(
            report.planar,
            vec![(id, PlanarOutcome::Tracked { inlier_fraction: 1.0 })]
        );
        let tracker = ctx.planars.get(id).unwrap();
        assert_eq!(tracker.center, Vec2::new(105.0, 100.0));
        assert_eq!(tracker.state, TrackState::Tracking);
        assert!(tracker.frame_homographies.contains_key(&FrameNr::new(1)));
        assert!(tracker.quad_is_sane());
    }

    #[test]
    fn three_failures_lose_the_tracker_and_an_edit_revives_it() {
        let (mut ctx, id) = context_with_tracker();
        let vision = StubVision {
            flow_offset: Vec2::new(5.0, 0.0),
            homography: StubHomography::Fail,
        };

        let mut outcomes = Vec::new();
        for f in 1..=3 {
            let report =
                advance_frame(&mut ctx, &vision, &pyramid(), &pyramid(), FrameNr::new(f));
            outcomes.extend(report.planar.into_iter().map(|(_, o)| o));
        }

        assert_eq!(
            outcomes,
            vec![
                PlanarOutcome::Skipped(UpdateFailure::EstimationFailed),
                PlanarOutcome::Skipped(UpdateFailure::EstimationFailed),
                PlanarOutcome::Lost(UpdateFailure::EstimationFailed),
            ]
        );
        let tracker = ctx.planars.get(id).unwrap();
        assert_eq!(tracker.state, TrackState::Lost);
        assert!(!tracker.active);

        // Lost trackers are out of the loop entirely.
        let report = advance_frame(&mut ctx, &vision, &pyramid(), &pyramid(), FrameNr::new(4));
        assert!(report.planar.is_empty());

        // A manual adjustment re-enters the automatic loop.
        assert!(ctx.adjust_corner(id, 0, Vec2::new(40.0, 40.0)));
        let tracker = ctx.planars.get(id).unwrap();
        assert_eq!(tracker.state, TrackState::Idle);
        assert!(tracker.active);
        assert!(tracker.needs_feature_regen);

        let report = advance_frame(&mut ctx, &vision, &pyramid(), &pyramid(), FrameNr::new(5));
        assert!(matches!(
            report.planar[..],
            [(_, PlanarOutcome::Regenerated { .. })]
        ));
        assert!(!ctx.planars.get(id).unwrap().needs_feature_regen);
    }

    #[test]
    fn low_inlier_fraction_is_skipped_and_leaves_the_quad() {
        let (mut ctx, id) = context_with_tracker();
        let vision = StubVision {
            flow_offset: Vec2::new(5.0, 0.0),
            homography: StubHomography::LowConfidence,
        };

        let report = advance_frame(&mut ctx, &vision, &pyramid(), &pyramid(), FrameNr::new(1));

        assert!(matches!(
            report.planar[..],
            [(_, PlanarOutcome::Skipped(UpdateFailure::ConfidenceTooLow { .. }))]
        ));
        let tracker = ctx.planars.get(id).unwrap();
        assert_eq!(tracker.center, Vec2::new(100.0, 100.0));
        assert_eq!(tracker.strikes, 1);
        assert!(tracker.homography.is_none());
    }

    #[test]
    fn degenerate_transform_reverts_the_corners() {
        let (mut ctx, id) = context_with_tracker();

        // First a good frame, so the tracker is in the tracking state.
        let good = StubVision {
            flow_offset: Vec2::new(2.0, 0.0),
            homography: StubHomography::Translate(Vec2::new(2.0, 0.0)),
        };
        advance_frame(&mut ctx, &good, &pyramid(), &pyramid(), FrameNr::new(1));
        assert_eq!(ctx.planars.get(id).unwrap().state, TrackState::Tracking);
        let quad_before = ctx.planars.get(id).unwrap().quad();

        let bad = StubVision {
            flow_offset: Vec2::new(2.0, 0.0),
            homography: StubHomography::Blowup,
        };
        let report = advance_frame(&mut ctx, &bad, &pyramid(), &pyramid(), FrameNr::new(2));

        assert!(matches!(
            report.planar[..],
            [(_, PlanarOutcome::Skipped(UpdateFailure::DegenerateTransform))]
        ));
        let tracker = ctx.planars.get(id).unwrap();
        assert_eq!(tracker.quad(), quad_before);
        assert_eq!(tracker.state, TrackState::Degraded);
        assert!(!tracker.trajectory.contains_key(&FrameNr::new(2)));
    }

    #[test]
    fn insufficient_features_trigger_regeneration() {
        let (mut ctx, id) = context_with_tracker();

        // Knock out most of the grid; 10 usable points remain.
        let feature_points = ctx.planars.get(id).unwrap().feature_points.clone();
        for &point_id in &feature_points[10..] {
            ctx.points.get_mut(point_id).unwrap().active = false;
        }

        let vision = StubVision {
            flow_offset: Vec2::ZERO,
            homography: StubHomography::Fail,
        };
        let report = advance_frame(&mut ctx, &vision, &pyramid(), &pyramid(), FrameNr::new(1));

        let [(_, PlanarOutcome::Regenerated { preserved, seeded })] = report.planar[..] else {
            panic!("expected a regeneration, got {:?}", report.planar);
        };
        assert_eq!(preserved, 10);
        assert!(seeded > 0);

        let tracker = ctx.planars.get(id).unwrap();
        assert!(tracker.feature_points.len() <= N_GRID);
        assert_eq!(tracker.strikes, 0);

        // Deactivated points keep their history.
        let dropped = ctx.points.get(feature_points[10]).unwrap();
        assert!(!dropped.active);
        assert!(!dropped.frame_positions.is_empty());
    }

    #[test]
    fn points_jumping_past_their_search_radius_are_lost() {
        let mut ctx = TrackerContext::new();
        let point_id = ctx.points.create(Vec2::new(50.0, 50.0), FrameNr::ZERO);

        let vision = StubVision {
            flow_offset: Vec2::new(100.0, 0.0), // way past the default radius
            homography: StubHomography::Fail,
        };
        let report = advance_frame(&mut ctx, &vision, &pyramid(), &pyramid(), FrameNr::new(1));

        assert_eq!(report.points_lost, 1);
        assert_eq!(report.points_tracked, 0);
        let point = ctx.points.get(point_id).unwrap();
        assert!(!point.active);
        assert_eq!(point.confidence, 0.0);
        // History retained: the creation frame is still there.
        assert_eq!(point.position_at(FrameNr::ZERO), Vec2::new(50.0, 50.0));
    }
}
