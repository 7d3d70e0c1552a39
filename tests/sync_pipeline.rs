// End-to-end tests for the track -> projection -> playback pipeline

use telesync::{
    LatLon, PlayMode, PlaybackEvent, PlaybackState, Projection, Sample, SyncController, Track,
    VideoInfo,
    sync::{interpolate_at, nearest_valid_point},
};

/// 2024-05-01T10:00:00Z
const START_MS: f64 = 1_714_557_600_000.;

fn valid(offset_ms: f64, lat: f64, lon: f64) -> Sample {
    Sample::from_raw(START_MS + offset_ms, Some(lat), Some(lon), None, None)
}

fn one_minute_track() -> Track {
    Track::load(vec![valid(0., 10., 20.), valid(60_000., 10.01, 20.02)]).unwrap()
}

fn position(projection: &Projection, frame: usize) -> LatLon {
    projection
        .at_frame(frame)
        .and_then(|p| p.sample.position())
        .unwrap()
}

#[test]
fn test_one_minute_at_one_fps() {
    let track = one_minute_track();
    let video = VideoInfo::new(60., 1., 1920, 1080);
    let projection = SyncController::new().reproject(&track, &video);

    assert_eq!(projection.frame_count(), 60);
    assert_eq!(projection.valid_frame_count(), 60);

    // frame 0 is the first fix itself
    assert_eq!(position(&projection, 0), LatLon::new(10., 20.));

    let mid = position(&projection, 30);
    assert!((mid.lat - 10.005).abs() < 1e-9);
    assert!((mid.lon - 20.01).abs() < 1e-9);

    let end = LatLon::new(10.01, 20.02);
    let near_end = position(&projection, 59);
    assert!((near_end.lat - (10. + 0.01 * 59. / 60.)).abs() < 1e-9);
    assert!(near_end.distance_m(&end) < 50.);
}

#[test]
fn test_projection_agrees_with_engine() {
    let track = one_minute_track();
    let video = VideoInfo::new(60., 25., 1920, 1080);
    let projection = Projection::build(&track, &video, 1_500);

    for point in projection.frames().iter().step_by(97) {
        let target = START_MS + point.video_time_ms + 1_500.;
        if target <= track.end_time_ms() {
            assert_eq!(Some(point.sample), interpolate_at(target, &track));
        } else {
            assert!(!point.is_valid());
        }
    }
}

#[test]
fn test_offset_past_recording_leaves_no_fix() {
    let track = one_minute_track();
    let video = VideoInfo::new(10., 30., 1920, 1080);
    let projection = Projection::build(&track, &video, 120_000);
    assert_eq!(projection.valid_frame_count(), 0);
    assert!(nearest_valid_point(LatLon::new(10., 20.), projection.frames()).is_none());
}

#[test]
fn test_map_click_seeks_to_nearest_frame() {
    let mut state = PlaybackState::new();
    state
        .load(one_minute_track(), VideoInfo::new(60., 1., 1920, 1080))
        .unwrap();

    let frame = state.resolve_click(LatLon::new(10.005, 20.01)).unwrap();
    assert_eq!(frame, 30);

    let events = state.seek(frame);
    assert!(events.iter().any(|e| matches!(
        e,
        PlaybackEvent::GraphIndicator { frame_index: 30, video_time_s } if *video_time_s == 30.
    )));
    assert_eq!(state.mode(), PlayMode::Ready);
}

#[test]
fn test_hold_last_valid_through_playback() {
    // valid fixes every second until (1, 1) at 5s, then a dropout to 10s
    let mut samples = (0..=5)
        .map(|s| {
            let deg = 0.5 + s as f64 * 0.1;
            valid(s as f64 * 1000., deg, deg)
        })
        .collect::<Vec<_>>();
    samples.extend((6..=10).map(|s| Sample::no_data(START_MS + s as f64 * 1000.)));
    let track = Track::load(samples).unwrap();

    let mut state = PlaybackState::new();
    state.load(track, VideoInfo::new(10., 1., 640, 480)).unwrap();
    state.play();

    state.on_time_update(5.2);
    let held = state.held_position().unwrap();
    assert!(held.distance_m(&LatLon::new(1., 1.)) < 1e-6);

    for t in [6., 7.5, 8., 9.9] {
        let events = state.on_time_update(t);
        let readout = events
            .iter()
            .find_map(|e| match e {
                PlaybackEvent::ReadoutChanged(r) => Some(*r),
                _ => None,
            })
            .unwrap();
        assert!(!readout.is_valid);
        assert_eq!(readout.display_position, Some(held));
    }
}
