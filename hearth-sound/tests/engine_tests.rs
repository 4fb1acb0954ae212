//! Soundscape engine behaviour on virtual time
//!
//! Fades tick every 50ms and timers run for minutes, so every test runs with
//! a paused clock that auto-advances while the test awaits.

mod helpers;

use helpers::{approx, recording_engine};
use hearth_sound::playback::TIMER_FADE_OUT_MS;
use hearth_sound::PlaybackStatus;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::sleep;

const FOCUS_PINK: f32 = 0.35;
const FOCUS_KEYS: f32 = 0.25;

#[tokio::test(start_paused = true)]
async fn test_fade_out_stops_and_fires_callback_once() {
    let (engine, backend, completions) = recording_engine(0.8);
    engine.start("focus");
    engine.fade_out(1000);
    assert_eq!(engine.status(), PlaybackStatus::Fading);

    sleep(Duration::from_millis(510)).await;
    let live = backend.live();
    assert_eq!(live.len(), 2);
    assert!(approx(live[0].volume, FOCUS_PINK * 0.8 * 0.5), "got {}", live[0].volume);
    assert!(approx(live[1].volume, FOCUS_KEYS * 0.8 * 0.5), "got {}", live[1].volume);
    assert_eq!(completions.load(Ordering::SeqCst), 0);

    sleep(Duration::from_millis(600)).await;
    assert_eq!(engine.status(), PlaybackStatus::Stopped);
    assert_eq!(engine.live_sources(), 0);
    assert!(backend.live().is_empty());
    assert_eq!(engine.current_mix_id(), None);
    assert_eq!(completions.load(Ordering::SeqCst), 1);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(completions.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fade_out_reaches_silence_before_release() {
    let (engine, backend, _) = recording_engine(0.8);
    engine.start("reading");
    engine.fade_out(200);

    sleep(Duration::from_millis(300)).await;
    for record in backend.records() {
        assert_eq!(record.volume, 0.0, "layer {}", record.layer_id);
        assert!(record.released);
    }
}

#[tokio::test(start_paused = true)]
async fn test_stop_does_not_fire_callback() {
    let (engine, backend, completions) = recording_engine(0.8);
    engine.start("focus");
    engine.stop();

    assert_eq!(engine.status(), PlaybackStatus::Stopped);
    assert_eq!(engine.live_sources(), 0);
    assert!(backend.live().is_empty());

    sleep(Duration::from_secs(5)).await;
    assert_eq!(completions.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_fade_out_cancels_callback() {
    let (engine, _, completions) = recording_engine(0.8);
    engine.start("focus");
    engine.fade_out(1000);

    sleep(Duration::from_millis(300)).await;
    engine.stop();

    sleep(Duration::from_secs(2)).await;
    assert_eq!(engine.status(), PlaybackStatus::Stopped);
    assert_eq!(completions.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fade_in_ramps_to_target() {
    let (engine, backend, _) = recording_engine(0.8);
    engine.start("focus");
    engine.fade_in(500);

    assert_eq!(engine.status(), PlaybackStatus::Fading);
    assert!(backend.live().iter().all(|r| r.volume == 0.0));

    sleep(Duration::from_millis(260)).await;
    let live = backend.live();
    assert!(approx(live[0].volume, FOCUS_PINK * 0.8 * 0.5), "got {}", live[0].volume);

    sleep(Duration::from_millis(250)).await;
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    let live = backend.live();
    assert!(approx(live[0].volume, FOCUS_PINK * 0.8));
    assert!(approx(live[1].volume, FOCUS_KEYS * 0.8));

    // start, reset to 0, then ten strictly increasing ticks
    let history = &live[0].volume_history;
    let ramp = &history[history.len() - 10..];
    assert!(ramp.windows(2).all(|w| w[0] < w[1]), "{:?}", ramp);
}

#[tokio::test(start_paused = true)]
async fn test_new_fade_supersedes_running_fade() {
    let (engine, _, completions) = recording_engine(0.8);
    engine.start("focus");
    engine.fade_out(1000);

    sleep(Duration::from_millis(500)).await;
    engine.fade_in(500);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    assert_eq!(engine.live_sources(), 2);
    assert_eq!(completions.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_volume_change_during_fade_applies_next_tick() {
    let (engine, backend, _) = recording_engine(0.8);
    engine.start("focus");
    engine.fade_in(1000);

    sleep(Duration::from_millis(520)).await;
    engine.set_volume(0.4);
    assert!(approx(backend.live()[0].volume, FOCUS_PINK * 0.4));

    sleep(Duration::from_millis(50)).await;
    assert!(approx(backend.live()[0].volume, FOCUS_PINK * 0.4 * 0.55));
}

#[tokio::test(start_paused = true)]
async fn test_timer_supersedes_timer() {
    let (engine, _, completions) = recording_engine(0.8);
    engine.start("bedtime");
    engine.set_timer(Some(30.0));
    engine.set_timer(Some(5.0));

    assert_eq!(engine.snapshot().timer_remaining_ms, Some(5 * 60_000));

    sleep(Duration::from_secs(5 * 60) + Duration::from_millis(1500)).await;
    assert_eq!(engine.status(), PlaybackStatus::Fading);
    assert_eq!(engine.snapshot().timer_remaining_ms, None);

    sleep(Duration::from_millis(TIMER_FADE_OUT_MS)).await;
    assert_eq!(engine.status(), PlaybackStatus::Stopped);
    assert_eq!(completions.load(Ordering::SeqCst), 1);

    // The 30 minute timer was cancelled, not merely outrun
    engine.start("bedtime");
    sleep(Duration::from_secs(30 * 60)).await;
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    assert_eq!(completions.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_non_positive_timer_only_clears() {
    let (engine, _, completions) = recording_engine(0.8);
    engine.start("calm-play");
    engine.set_timer(Some(1.0));
    engine.set_timer(Some(0.0));
    assert_eq!(engine.snapshot().timer_remaining_ms, None);

    engine.set_timer(Some(1.0));
    engine.set_timer(Some(-3.0));
    engine.set_timer(Some(f64::NAN));
    engine.set_timer(None);

    sleep(Duration::from_secs(10 * 60)).await;
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    assert_eq!(completions.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_volume_clamping() {
    let (engine, backend, _) = recording_engine(0.8);
    engine.start("focus");

    engine.set_volume(-1.0);
    let low = engine.snapshot();
    engine.set_volume(0.0);
    assert_eq!(engine.snapshot(), low);
    assert_eq!(low.volume, 0.0);
    assert!(backend.live().iter().all(|r| r.volume == 0.0));

    engine.set_volume(2.0);
    let high = engine.snapshot();
    engine.set_volume(1.0);
    assert_eq!(engine.snapshot(), high);
    assert_eq!(high.volume, 1.0);
    assert!(approx(backend.live()[0].volume, FOCUS_PINK));
}

#[tokio::test(start_paused = true)]
async fn test_unknown_mix_is_noop() {
    let (engine, backend, _) = recording_engine(0.8);
    engine.start("nonexistent-id");
    assert_eq!(engine.status(), PlaybackStatus::Idle);
    assert_eq!(backend.opened(), 0);

    engine.start("focus");
    let before = engine.snapshot();
    engine.start("nonexistent-id");
    assert_eq!(engine.snapshot(), before);
    assert_eq!(backend.opened(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_start_replaces_previous_mix() {
    let (engine, backend, _) = recording_engine(0.8);
    engine.start("focus");
    engine.set_timer(Some(10.0));
    engine.start("reading");

    assert_eq!(engine.current_mix_id().as_deref(), Some("reading"));
    assert_eq!(engine.live_sources(), 2);
    assert_eq!(engine.snapshot().timer_remaining_ms, None);

    let records = backend.records();
    assert_eq!(records.len(), 4);
    assert!(records[..2].iter().all(|r| r.released));
    let live: Vec<_> = backend.live().into_iter().map(|r| r.layer_id).collect();
    assert_eq!(live, vec!["white", "rain"]);
}

#[tokio::test(start_paused = true)]
async fn test_blocked_autoplay_is_swallowed() {
    let (engine, backend, _) = recording_engine(0.8);
    backend.block_autoplay();
    engine.start("calm-play");

    assert_eq!(engine.status(), PlaybackStatus::Playing);
    assert_eq!(engine.live_sources(), 2);
    assert!(backend.records().iter().all(|r| r.play_calls == 1));
}

#[tokio::test(start_paused = true)]
async fn test_drop_releases_everything() {
    let (engine, backend, completions) = recording_engine(0.8);
    engine.start("bedtime");
    engine.set_timer(Some(1.0));
    engine.fade_out(1000);
    drop(engine);

    assert!(backend.live().is_empty());
    sleep(Duration::from_secs(5 * 60)).await;
    assert_eq!(completions.load(Ordering::SeqCst), 0);
}
