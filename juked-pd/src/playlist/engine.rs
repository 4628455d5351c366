//! Playlist engine: the per-playlist playback state machine
//!
//! Each engine owns one [`SongList`], a virtual clock (`elapsed`, whole
//! seconds), and two flags: `processing` (the control loop is running) and
//! `playing` (the clock is advancing). `playing` implies `processing`.
//!
//! A launched engine runs its control loop as an independent task. Transport
//! commands (play/pause/next/prev/stop) travel through a per-launch mailbox
//! and carry a oneshot acknowledgement: the caller's command returns only
//! after the loop has observed and applied it, so a caller that got `Ok`
//! back can rely on the flags it just changed. Structural operations
//! (add/remove/edit/seek/status) act directly on the locked state and never
//! touch the mailbox.
//!
//! No handler holds the state lock across a mailbox send or an ack await;
//! the mailbox sender is cloned out under the lock and used after release.

use crate::error::{Error, Result};
use crate::playlist::SongList;
use juked_common::api::{PlaylistStatus, SongEntry};
use juked_common::events::PlaybackEvent;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::time::{sleep, timeout, Duration};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// One clock tick: the whole-second granularity of simulated playback
pub const TICK: Duration = Duration::from_secs(1);

/// Bound on mailbox send and ack waits. A command racing loop termination
/// fails with `NotProcessing` after this instead of blocking forever.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);

/// Commands handled by the control loop; each carries its ack sender
enum Command {
    Play(oneshot::Sender<()>),
    Pause(oneshot::Sender<()>),
    Next(oneshot::Sender<()>),
    Prev(oneshot::Sender<()>),
    Stop(oneshot::Sender<()>),
}

/// What the loop does after applying a command
enum LoopAction {
    /// Keep waiting in the current mode
    Continue,
    /// Leave the tick loop and re-evaluate flags and position
    Interrupt,
    /// Leave the control loop entirely
    Terminate,
}

/// Why the control loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitReason {
    /// Current ran off the end of the list
    Exhausted,
    /// Explicit stop command
    Stopped,
    /// Shared cancellation token fired
    Cancelled,
    /// Mailbox closed underneath the loop
    MailboxClosed,
}

/// Everything the loop and the command handlers share, under one lock
struct EngineState {
    name: String,
    songs: SongList,
    /// Seconds accumulated against the current song
    elapsed: u64,
    processing: bool,
    playing: bool,
    /// Sender side of the current launch's mailbox; None while idle
    mailbox: Option<mpsc::Sender<Command>>,
}

/// The per-playlist playback state machine
pub struct PlaylistEngine {
    id: i64,
    state: RwLock<EngineState>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlaylistEngine {
    pub fn new(id: i64, name: String, events: broadcast::Sender<PlaybackEvent>) -> Self {
        debug!(playlist = id, "engine created");
        Self {
            id,
            state: RwLock::new(EngineState {
                name,
                songs: SongList::new(id),
                elapsed: 0,
                processing: false,
                playing: false,
                mailbox: None,
            }),
            events,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start the control loop as a tracked task
    ///
    /// Resets `current` to the head when a previous run exhausted the list.
    /// The new loop starts paused; `play` starts the clock.
    pub async fn launch(
        self: Arc<Self>,
        cancel: CancellationToken,
        tracker: &TaskTracker,
    ) -> Result<()> {
        let (tx, rx) = mpsc::channel(8);

        {
            let mut st = self.state.write().await;
            if st.processing {
                return Err(Error::AlreadyProcessing(self.id));
            }
            if st.songs.current().is_none() {
                st.songs.reset_to_head();
                st.elapsed = 0;
            }
            st.processing = true;
            st.playing = false;
            st.mailbox = Some(tx.clone());
        }

        let engine = Arc::clone(&self);
        tracker.spawn(async move { engine.run(rx, tx, cancel).await });

        info!(playlist = self.id, "launched");
        Ok(())
    }

    /// Control loop body; one task per launch
    async fn run(
        self: Arc<Self>,
        mut commands: mpsc::Receiver<Command>,
        my_mailbox: mpsc::Sender<Command>,
        cancel: CancellationToken,
    ) {
        info!(playlist = self.id, "control loop active");
        self.emit(PlaybackEvent::PlaylistStarted {
            playlist_id: self.id,
        });

        let reason = self.drive(&mut commands, &cancel).await;

        // Tear down under the lock so a relaunch racing this exit cannot be
        // clobbered: only clear state that still belongs to this launch.
        {
            let mut st = self.state.write().await;
            let ours = st
                .mailbox
                .as_ref()
                .is_some_and(|tx| tx.same_channel(&my_mailbox));
            if ours {
                st.mailbox = None;
                st.playing = false;
                st.processing = false;
            }
        }

        match reason {
            ExitReason::Exhausted => self.emit(PlaybackEvent::PlaylistFinished {
                playlist_id: self.id,
            }),
            ExitReason::Stopped | ExitReason::Cancelled | ExitReason::MailboxClosed => {
                self.emit(PlaybackEvent::PlaylistStopped {
                    playlist_id: self.id,
                })
            }
        }

        info!(playlist = self.id, ?reason, "control loop inactive");
    }

    /// The decision loop: one iteration per decision point
    async fn drive(
        &self,
        commands: &mut mpsc::Receiver<Command>,
        cancel: &CancellationToken,
    ) -> ExitReason {
        loop {
            if cancel.is_cancelled() {
                return ExitReason::Cancelled;
            }

            let (processing, playing, has_current) = {
                let st = self.state.read().await;
                (st.processing, st.playing, st.songs.current().is_some())
            };

            if !processing {
                return ExitReason::Stopped;
            }
            if !has_current {
                return ExitReason::Exhausted;
            }

            if !playing {
                // Paused: no time advances until a command or cancellation
                tokio::select! {
                    _ = cancel.cancelled() => return ExitReason::Cancelled,
                    cmd = commands.recv() => match cmd {
                        None => return ExitReason::MailboxClosed,
                        Some(cmd) => {
                            if let LoopAction::Terminate = self.apply(cmd).await {
                                return ExitReason::Stopped;
                            }
                        }
                    },
                }
                continue;
            }

            // Playing: advance the clock one unit per tick until interrupted
            'ticking: loop {
                tokio::select! {
                    _ = cancel.cancelled() => return ExitReason::Cancelled,
                    cmd = commands.recv() => match cmd {
                        None => return ExitReason::MailboxClosed,
                        Some(cmd) => match self.apply(cmd).await {
                            LoopAction::Terminate => return ExitReason::Stopped,
                            LoopAction::Interrupt => break 'ticking,
                            LoopAction::Continue => {}
                        }
                    },
                    _ = sleep(TICK) => {
                        if self.tick().await {
                            break 'ticking;
                        }
                    }
                }
            }
        }
    }

    /// One elapsed tick with no command. Returns true when the current song
    /// completed and the position moved (or the list ran out).
    async fn tick(&self) -> bool {
        let (completed, changed_to) = {
            let mut st = self.state.write().await;
            let Some(song) = st.songs.current() else {
                return true;
            };
            let (song_id, duration) = (song.id, song.duration);

            if st.elapsed == duration {
                let next_id = st.songs.advance_current();
                st.elapsed = 0;
                (true, next_id)
            } else {
                st.elapsed += 1;
                debug!(
                    playlist = self.id,
                    song = song_id,
                    elapsed = st.elapsed,
                    "tick"
                );
                (false, None)
            }
        };

        if let Some(song_id) = changed_to {
            debug!(playlist = self.id, song = song_id, "advanced to next song");
            self.emit(PlaybackEvent::SongChanged {
                playlist_id: self.id,
                song_id,
            });
        }

        completed
    }

    /// Apply one mailbox command, ack it, and tell the loop what to do next
    async fn apply(&self, cmd: Command) -> LoopAction {
        match cmd {
            Command::Play(ack) => {
                let song_id = {
                    let mut st = self.state.write().await;
                    st.playing = true;
                    st.songs.current().map(|s| s.id)
                };
                if let Some(song_id) = song_id {
                    self.emit(PlaybackEvent::Playing {
                        playlist_id: self.id,
                        song_id,
                    });
                }
                let _ = ack.send(());
                LoopAction::Continue
            }
            Command::Pause(ack) => {
                let snapshot = {
                    let mut st = self.state.write().await;
                    st.playing = false;
                    st.songs.current().map(|s| (s.id, st.elapsed))
                };
                if let Some((song_id, elapsed)) = snapshot {
                    self.emit(PlaybackEvent::Paused {
                        playlist_id: self.id,
                        song_id,
                        elapsed,
                    });
                }
                let _ = ack.send(());
                LoopAction::Interrupt
            }
            // Position already moved by the caller; these are wake-ups
            Command::Next(ack) | Command::Prev(ack) => {
                let _ = ack.send(());
                LoopAction::Interrupt
            }
            Command::Stop(ack) => {
                {
                    let mut st = self.state.write().await;
                    st.playing = false;
                    st.processing = false;
                }
                let _ = ack.send(());
                LoopAction::Terminate
            }
        }
    }

    // ------------------------------------------------------------------
    // Transport commands (handshake with the loop)
    // ------------------------------------------------------------------

    /// Resume the clock
    pub async fn play(&self) -> Result<()> {
        let tx = {
            let st = self.state.read().await;
            if !st.processing {
                return Err(Error::NotProcessing(self.id));
            }
            if st.playing {
                return Err(Error::AlreadyPlaying(self.id));
            }
            st.mailbox.clone().ok_or(Error::NotProcessing(self.id))?
        };

        self.handshake(tx, Command::Play).await?;
        info!(playlist = self.id, "play");
        Ok(())
    }

    /// Halt the clock, keeping the loop alive
    pub async fn pause(&self) -> Result<()> {
        let tx = {
            let st = self.state.read().await;
            if !st.processing {
                return Err(Error::NotProcessing(self.id));
            }
            if !st.playing {
                return Err(Error::AlreadyPaused(self.id));
            }
            st.mailbox.clone().ok_or(Error::NotProcessing(self.id))?
        };

        self.handshake(tx, Command::Pause).await?;
        info!(playlist = self.id, "pause");
        Ok(())
    }

    /// Move to the next song and wake the loop
    pub async fn next(&self) -> Result<()> {
        let (tx, song_id) = {
            let mut st = self.state.write().await;
            if !st.processing {
                return Err(Error::NotProcessing(self.id));
            }
            if !st.songs.has_next() {
                return Err(Error::NoSuccessor(self.id));
            }
            let Some(song_id) = st.songs.advance_current() else {
                return Err(Error::NoSuccessor(self.id));
            };
            st.elapsed = 0;
            let tx = st.mailbox.clone().ok_or(Error::NotProcessing(self.id))?;
            (tx, song_id)
        };

        self.emit(PlaybackEvent::SongChanged {
            playlist_id: self.id,
            song_id,
        });
        self.handshake(tx, Command::Next).await?;
        info!(playlist = self.id, song = song_id, "switched to next song");
        Ok(())
    }

    /// Move to the previous song and wake the loop
    pub async fn prev(&self) -> Result<()> {
        let (tx, song_id) = {
            let mut st = self.state.write().await;
            if !st.processing {
                return Err(Error::NotProcessing(self.id));
            }
            if !st.songs.has_prev() {
                return Err(Error::NoPredecessor(self.id));
            }
            let Some(song_id) = st.songs.retreat_current() else {
                return Err(Error::NoPredecessor(self.id));
            };
            st.elapsed = 0;
            let tx = st.mailbox.clone().ok_or(Error::NotProcessing(self.id))?;
            (tx, song_id)
        };

        self.emit(PlaybackEvent::SongChanged {
            playlist_id: self.id,
            song_id,
        });
        self.handshake(tx, Command::Prev).await?;
        info!(playlist = self.id, song = song_id, "switched to previous song");
        Ok(())
    }

    /// Terminate the control loop
    pub async fn stop(&self) -> Result<()> {
        let tx = {
            let st = self.state.read().await;
            if !st.processing {
                return Err(Error::AlreadyStopped(self.id));
            }
            st.mailbox.clone().ok_or(Error::AlreadyStopped(self.id))?
        };

        self.handshake(tx, Command::Stop).await?;
        info!(playlist = self.id, "stop");
        Ok(())
    }

    /// Send a command and wait for the loop's acknowledgement, both bounded
    async fn handshake(
        &self,
        tx: mpsc::Sender<Command>,
        make: impl FnOnce(oneshot::Sender<()>) -> Command,
    ) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();

        match timeout(HANDSHAKE_TIMEOUT, tx.send(make(ack_tx))).await {
            Ok(Ok(())) => {}
            // Mailbox full past the timeout or closed: the loop is gone or
            // going; report the engine as not processing
            Ok(Err(_)) | Err(_) => {
                warn!(playlist = self.id, "command handshake failed to send");
                return Err(Error::NotProcessing(self.id));
            }
        }

        match timeout(HANDSHAKE_TIMEOUT, ack_rx).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) | Err(_) => {
                warn!(playlist = self.id, "command handshake never acknowledged");
                Err(Error::NotProcessing(self.id))
            }
        }
    }

    // ------------------------------------------------------------------
    // Structural operations (direct on the locked state)
    // ------------------------------------------------------------------

    /// Seek within the current song
    pub async fn set_time(&self, time: u64) -> Result<()> {
        let mut st = self.state.write().await;
        let Some(song) = st.songs.current() else {
            return Err(Error::EmptyList(self.id));
        };
        let duration = song.duration;
        if time > duration {
            return Err(Error::TimeExceedsDuration { time, duration });
        }
        st.elapsed = time;
        info!(playlist = self.id, time, "set time");
        Ok(())
    }

    /// Append a song (id assigned by the store)
    pub async fn add_song(&self, id: i64, name: String, duration: u64) -> Result<()> {
        let mut st = self.state.write().await;
        st.songs.add(id, name, duration)?;
        info!(playlist = self.id, song = id, duration, "added song");
        Ok(())
    }

    /// Remove a song; refused for the current song while the clock runs
    pub async fn remove_song(&self, id: i64) -> Result<()> {
        let mut st = self.state.write().await;
        if st.songs.is_empty() {
            return Err(Error::EmptyList(self.id));
        }
        if st.playing && st.songs.current().map(|s| s.id) == Some(id) {
            return Err(Error::RemovePlayingItem(self.id, id));
        }

        let was_current = st.songs.remove(id)?;
        if was_current {
            st.elapsed = 0;
        }
        info!(playlist = self.id, song = id, "removed song");
        Ok(())
    }

    /// Update a song's name and duration
    ///
    /// Refused for the current song while the clock runs. Shortening the
    /// current song below the accumulated time clamps the clock to the new
    /// duration so the elapsed-within-duration invariant holds.
    pub async fn edit_song(&self, id: i64, name: String, duration: u64) -> Result<()> {
        let mut st = self.state.write().await;
        let is_current = st.songs.current().map(|s| s.id) == Some(id);
        if st.playing && is_current {
            return Err(Error::RemovePlayingItem(self.id, id));
        }

        let Some(song) = st.songs.find_mut(id) else {
            return Err(Error::NotFound(format!(
                "no song {} in playlist {}",
                id, self.id
            )));
        };
        song.name = name;
        song.duration = duration;

        if is_current && st.elapsed > duration {
            st.elapsed = duration;
        }
        info!(playlist = self.id, song = id, duration, "edited song");
        Ok(())
    }

    /// Rename the playlist (store already updated by the registry)
    pub async fn rename(&self, name: String) {
        let mut st = self.state.write().await;
        st.name = name;
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Read-only snapshot; never mutates state
    pub async fn status(&self) -> PlaylistStatus {
        let st = self.state.read().await;
        PlaylistStatus {
            id: self.id,
            name: st.name.clone(),
            processing: st.processing,
            playing: st.playing,
            elapsed: st.elapsed,
            current: st.songs.current().map(|s| SongEntry {
                id: s.id,
                name: s.name.clone(),
                duration: s.duration,
            }),
        }
    }

    /// Ordered copy of the song list
    pub async fn songs(&self) -> Vec<SongEntry> {
        self.state.read().await.songs.snapshot()
    }

    /// Whether a song id is present in the list
    pub async fn has_song(&self, id: i64) -> bool {
        self.state.read().await.songs.find(id).is_some()
    }

    fn emit(&self, event: PlaybackEvent) {
        // Lossy: no subscribers is fine
        let _ = self.events.send(event);
    }
}
