//! Engine state-machine tests
//!
//! These run under tokio's paused clock: the engine's one-second tick
//! advances through virtual time, so multi-second playback scenarios finish
//! instantly and assertions on the clock are deterministic.

use juked_common::events::PlaybackEvent;
use juked_pd::error::Error;
use juked_pd::PlaylistEngine;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

struct TestEngine {
    engine: Arc<PlaylistEngine>,
    cancel: CancellationToken,
    tracker: TaskTracker,
    events: broadcast::Sender<PlaybackEvent>,
}

impl TestEngine {
    async fn with_songs(songs: &[(i64, &str, u64)]) -> Self {
        let (events, _) = broadcast::channel(64);
        let engine = Arc::new(PlaylistEngine::new(1, "test".to_string(), events.clone()));
        for &(id, name, duration) in songs {
            engine.add_song(id, name.to_string(), duration).await.unwrap();
        }
        Self {
            engine,
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
            events,
        }
    }

    async fn launch(&self) -> juked_pd::Result<()> {
        Arc::clone(&self.engine)
            .launch(self.cancel.clone(), &self.tracker)
            .await
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn empty_playlist_launch_terminates_immediately() {
    let t = TestEngine::with_songs(&[]).await;
    t.launch().await.unwrap();

    // Give the loop a turn to observe the empty list
    sleep(Duration::from_millis(20)).await;

    let status = t.engine.status().await;
    assert!(!status.processing);
    assert!(!status.playing);
    assert!(status.current.is_none());
}

#[tokio::test(start_paused = true)]
async fn clock_advances_past_song_boundary() {
    let t = TestEngine::with_songs(&[(10, "a", 5), (11, "b", 3)]).await;
    t.launch().await.unwrap();
    t.engine.play().await.unwrap();

    // Song a completes at the sixth tick; check just after it
    sleep(Duration::from_millis(6500)).await;

    let status = t.engine.status().await;
    assert!(status.processing);
    assert!(status.playing);
    assert_eq!(status.current.as_ref().unwrap().id, 11);
    assert_eq!(status.elapsed, 0);
}

#[tokio::test(start_paused = true)]
async fn play_on_playing_engine_is_rejected() {
    let t = TestEngine::with_songs(&[(1, "a", 5)]).await;
    t.launch().await.unwrap();
    t.engine.play().await.unwrap();

    let before = t.engine.status().await;
    assert!(matches!(
        t.engine.play().await,
        Err(Error::AlreadyPlaying(1))
    ));
    let after = t.engine.status().await;
    assert_eq!(before, after);
}

#[tokio::test(start_paused = true)]
async fn seek_past_duration_is_rejected() {
    let t = TestEngine::with_songs(&[(1, "a", 5)]).await;

    assert!(matches!(
        t.engine.set_time(6).await,
        Err(Error::TimeExceedsDuration { time: 6, duration: 5 })
    ));
    assert_eq!(t.engine.status().await.elapsed, 0);

    t.engine.set_time(5).await.unwrap();
    assert_eq!(t.engine.status().await.elapsed, 5);
}

#[tokio::test(start_paused = true)]
async fn removing_the_playing_song_requires_a_pause() {
    let t = TestEngine::with_songs(&[(1, "a", 5), (2, "b", 3)]).await;
    t.launch().await.unwrap();
    t.engine.play().await.unwrap();

    assert!(matches!(
        t.engine.remove_song(1).await,
        Err(Error::RemovePlayingItem(1, 1))
    ));

    t.engine.pause().await.unwrap();
    t.engine.remove_song(1).await.unwrap();

    let status = t.engine.status().await;
    assert_eq!(status.current.as_ref().unwrap().id, 2);
    assert_eq!(status.elapsed, 0);
}

// ---------------------------------------------------------------------------
// Transport command preconditions
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn transport_commands_on_idle_engine_fail() {
    let t = TestEngine::with_songs(&[(1, "a", 5)]).await;

    assert!(matches!(t.engine.play().await, Err(Error::NotProcessing(1))));
    assert!(matches!(t.engine.pause().await, Err(Error::NotProcessing(1))));
    assert!(matches!(t.engine.next().await, Err(Error::NotProcessing(1))));
    assert!(matches!(t.engine.prev().await, Err(Error::NotProcessing(1))));
    assert!(matches!(t.engine.stop().await, Err(Error::AlreadyStopped(1))));
}

#[tokio::test(start_paused = true)]
async fn launch_while_processing_is_rejected() {
    let t = TestEngine::with_songs(&[(1, "a", 5)]).await;
    t.launch().await.unwrap();
    assert!(matches!(t.launch().await, Err(Error::AlreadyProcessing(1))));
}

#[tokio::test(start_paused = true)]
async fn pause_on_paused_engine_is_rejected() {
    let t = TestEngine::with_songs(&[(1, "a", 5)]).await;
    t.launch().await.unwrap();
    assert!(matches!(t.engine.pause().await, Err(Error::AlreadyPaused(1))));
}

#[tokio::test(start_paused = true)]
async fn next_and_prev_stop_exactly_at_the_boundaries() {
    let t = TestEngine::with_songs(&[(1, "a", 5), (2, "b", 5), (3, "c", 5)]).await;
    t.launch().await.unwrap();

    t.engine.next().await.unwrap();
    t.engine.next().await.unwrap();
    assert!(matches!(t.engine.next().await, Err(Error::NoSuccessor(1))));
    assert_eq!(t.engine.status().await.current.as_ref().unwrap().id, 3);

    t.engine.prev().await.unwrap();
    t.engine.prev().await.unwrap();
    assert!(matches!(t.engine.prev().await, Err(Error::NoPredecessor(1))));
    assert_eq!(t.engine.status().await.current.as_ref().unwrap().id, 1);
}

// ---------------------------------------------------------------------------
// Clock behavior
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn pause_halts_the_clock() {
    let t = TestEngine::with_songs(&[(1, "a", 10)]).await;
    t.launch().await.unwrap();
    t.engine.play().await.unwrap();

    sleep(Duration::from_millis(2500)).await;
    t.engine.pause().await.unwrap();
    let paused_at = t.engine.status().await.elapsed;
    assert_eq!(paused_at, 2);

    // No time advances while paused
    sleep(Duration::from_secs(5)).await;
    let status = t.engine.status().await;
    assert!(!status.playing);
    assert!(status.processing);
    assert_eq!(status.elapsed, paused_at);
}

#[tokio::test(start_paused = true)]
async fn stop_terminates_the_loop_and_keeps_position() {
    let t = TestEngine::with_songs(&[(1, "a", 10), (2, "b", 5)]).await;
    t.launch().await.unwrap();
    t.engine.play().await.unwrap();

    sleep(Duration::from_millis(2500)).await;
    t.engine.stop().await.unwrap();

    let status = t.engine.status().await;
    assert!(!status.processing);
    assert!(!status.playing);
    assert_eq!(status.current.as_ref().unwrap().id, 1);
    assert_eq!(status.elapsed, 2);
}

#[tokio::test(start_paused = true)]
async fn exhausted_playlist_relaunches_from_the_head() {
    let t = TestEngine::with_songs(&[(1, "a", 1), (2, "b", 1)]).await;
    t.launch().await.unwrap();
    t.engine.play().await.unwrap();

    // Each one-second song takes two ticks (advance happens on the tick
    // after the clock reaches the duration)
    sleep(Duration::from_millis(4500)).await;
    let status = t.engine.status().await;
    assert!(!status.processing, "loop should have exhausted the list");
    assert!(status.current.is_none());

    t.launch().await.unwrap();
    let status = t.engine.status().await;
    assert!(status.processing);
    assert!(!status.playing);
    assert_eq!(status.current.as_ref().unwrap().id, 1);
    assert_eq!(status.elapsed, 0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_is_observed_within_one_tick() {
    let t = TestEngine::with_songs(&[(1, "a", 100)]).await;
    t.launch().await.unwrap();
    t.engine.play().await.unwrap();

    sleep(Duration::from_millis(1500)).await;
    t.cancel.cancel();
    sleep(Duration::from_millis(1100)).await;

    assert!(!t.engine.status().await.processing);

    t.tracker.close();
    t.tracker.wait().await;
    assert_eq!(t.tracker.len(), 0);
}

// ---------------------------------------------------------------------------
// Invariants and snapshot semantics
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn playing_always_implies_processing() {
    let t = TestEngine::with_songs(&[(1, "a", 3), (2, "b", 3)]).await;

    let check = |s: &juked_common::api::PlaylistStatus| {
        assert!(!s.playing || s.processing, "playing without processing");
        if let Some(current) = &s.current {
            assert!(s.elapsed <= current.duration, "elapsed beyond duration");
        }
    };

    check(&t.engine.status().await);
    t.launch().await.unwrap();
    check(&t.engine.status().await);
    t.engine.play().await.unwrap();
    check(&t.engine.status().await);
    sleep(Duration::from_millis(2500)).await;
    check(&t.engine.status().await);
    t.engine.pause().await.unwrap();
    check(&t.engine.status().await);
    t.engine.stop().await.unwrap();
    check(&t.engine.status().await);
}

#[tokio::test(start_paused = true)]
async fn status_is_idempotent() {
    let t = TestEngine::with_songs(&[(1, "a", 5)]).await;
    t.launch().await.unwrap();
    t.engine.play().await.unwrap();
    t.engine.pause().await.unwrap();

    let first = t.engine.status().await;
    let second = t.engine.status().await;
    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn shortening_the_current_song_clamps_the_clock() {
    let t = TestEngine::with_songs(&[(1, "a", 10)]).await;
    t.engine.set_time(8).await.unwrap();

    t.engine.edit_song(1, "a".to_string(), 4).await.unwrap();

    let status = t.engine.status().await;
    assert_eq!(status.elapsed, 4);
    assert_eq!(status.current.as_ref().unwrap().duration, 4);
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn a_full_run_emits_the_playback_event_sequence() {
    let t = TestEngine::with_songs(&[(1, "a", 1)]).await;
    let mut rx = t.events.subscribe();

    t.launch().await.unwrap();
    t.engine.play().await.unwrap();
    sleep(Duration::from_millis(2500)).await;

    assert!(matches!(
        rx.recv().await.unwrap(),
        PlaybackEvent::PlaylistStarted { playlist_id: 1 }
    ));
    assert!(matches!(
        rx.recv().await.unwrap(),
        PlaybackEvent::Playing { playlist_id: 1, song_id: 1 }
    ));
    assert!(matches!(
        rx.recv().await.unwrap(),
        PlaybackEvent::PlaylistFinished { playlist_id: 1 }
    ));
    assert!(!t.engine.status().await.processing);
}
