//! Save/load round-trips of whole projects.

use glam::{Vec2, Vec3};

use tracktext::{
    Anchor, FrameNr, Homography, ProjectDoc, SourceRef, TrackerContext,
};

fn source_ref() -> SourceRef {
    SourceRef {
        path: "clips/skate.mp4".to_owned(),
        width: 1280,
        height: 720,
        fps: 30.0,
        duration_secs: 12.5,
    }
}

fn populated_context() -> TrackerContext {
    let mut ctx = TrackerContext::new();

    let point_id = ctx.points.create(Vec2::new(100.0, 100.0), FrameNr::ZERO);
    for f in 1..=20 {
        ctx.points.commit(
            point_id,
            FrameNr::new(f),
            Vec2::new(100.0 + f as f32 * 2.5, 100.0 - f as f32),
        );
    }

    let tracker_id = ctx.create_planar_tracker(
        Vec2::new(640.0, 360.0),
        Vec2::new(1280.0, 720.0),
        FrameNr::ZERO,
        None,
    );
    {
        let tracker = ctx.planars.get_mut(tracker_id).unwrap();
        tracker.record_frame(FrameNr::new(5));
        // Derived caches, which must not survive the round-trip.
        tracker.homography = Some(Homography::IDENTITY);
        tracker
            .frame_homographies
            .insert(FrameNr::new(5), Homography::IDENTITY);
    }

    let text_id = ctx.texts.create(Anchor::Point(point_id), FrameNr::new(3));
    {
        let text = ctx.texts.get_mut(text_id).unwrap();
        text.content = "look here".to_owned();
        text.transform.position = Vec3::new(20.0, -10.0, 0.0);
    }
    ctx.texts.create(Anchor::Planar(tracker_id), FrameNr::ZERO);

    ctx
}

#[test]
fn round_trip_preserves_semantics() -> anyhow::Result<()> {
    let ctx = populated_context();
    let doc = ProjectDoc::capture(&ctx, source_ref());

    let json = doc.to_json()?;
    let (restored, source) = ProjectDoc::from_json(&json)?.into_context();

    similar_asserts::assert_eq!(source, source_ref());

    // Points: full histories and trajectories.
    assert_eq!(restored.points.len(), ctx.points.len());
    let original: Vec<_> = ctx.points.iter().collect();
    let loaded: Vec<_> = restored.points.iter().collect();
    for (a, b) in original.iter().zip(&loaded) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.frame_positions, b.frame_positions);
        assert_eq!(a.trajectory, b.trajectory);
        assert_eq!(a.pos, b.pos);
    }

    // Trackers: quad, trajectory and feature list survive; caches do not.
    let tracker = restored.planars.iter().next().unwrap();
    let original_tracker = ctx.planars.iter().next().unwrap();
    assert_eq!(tracker.quad(), original_tracker.quad());
    assert_eq!(tracker.center, original_tracker.center);
    assert_eq!(tracker.trajectory, original_tracker.trajectory);
    assert_eq!(tracker.feature_points, original_tracker.feature_points);
    assert!(tracker.homography.is_none());
    assert!(tracker.frame_homographies.is_empty());

    // Texts.
    assert_eq!(restored.texts.len(), 2);
    let text = restored.texts.iter().next().unwrap();
    assert_eq!(text.content, "look here");
    assert_eq!(text.created_frame, FrameNr::new(3));

    Ok(())
}

#[test]
fn restored_stores_keep_minting_fresh_ids() -> anyhow::Result<()> {
    let ctx = populated_context();
    let highest_point = ctx.points.iter().map(|p| p.id).max().unwrap();

    let json = ProjectDoc::capture(&ctx, source_ref()).to_json()?;
    let (mut restored, _) = ProjectDoc::from_json(&json)?.into_context();

    let fresh = restored.points.create(Vec2::ZERO, FrameNr::ZERO);
    assert!(fresh > highest_point);
    Ok(())
}

#[test]
fn garbage_input_is_an_error_not_a_panic() {
    assert!(ProjectDoc::from_json("{\"source\": 12}").is_err());
    assert!(ProjectDoc::from_json("not json at all").is_err());
}
