//! Frame driver: pulls poses from a source, runs the selected detector and
//! republishes the whole state after every frame or command.
//!
//! One writer (the driver task), any number of readers through the
//! `watch` channel. Frames are processed strictly one at a time.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::exercise::{ExerciseKind, ExerciseState};
use crate::pose::Pose;
use crate::recorder::{WorkoutRecorder, WorkoutSummary};
use crate::session::{Session, SessionStatus};
use crate::source::PoseSource;

const COMMAND_BUFFER: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Resume,
    TogglePause,
    SelectExercise(ExerciseKind),
    Reset,
    Complete,
    NewWorkout,
    /// Stops the loop and closes the pose source.
    Stop,
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("frame driver has stopped")]
    Closed,
}

/// Everything a renderer or UI needs, published as one value.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub status: SessionStatus,
    pub exercise: ExerciseKind,
    pub state: ExerciseState,
    /// Latest pose, for skeleton drawing only.
    pub pose: Option<Pose>,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed: Duration,
    pub frames: u64,
    pub source_exhausted: bool,
    /// Set once the workout is completed.
    pub summary: Option<WorkoutSummary>,
}

#[derive(Debug, Clone, Default)]
pub struct DriverOptions {
    /// Minimum time between frame fetches. `None` runs as fast as the source yields.
    pub frame_interval: Option<Duration>,
}

impl DriverOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        let frame_interval = (config.target_fps > 0)
            .then(|| Duration::from_secs_f64(1.0 / config.target_fps as f64));
        Self { frame_interval }
    }
}

enum Event {
    Command(Option<Command>),
    Frame(Option<Pose>),
}

pub struct FrameDriver<S, R> {
    source: S,
    recorder: R,
    session: Session,
    commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<Snapshot>,
    options: DriverOptions,
    latest_pose: Option<Pose>,
    exhausted: bool,
    summary: Option<WorkoutSummary>,
}

impl<S: PoseSource, R: WorkoutRecorder> FrameDriver<S, R> {
    pub fn new(
        source: S,
        recorder: R,
        exercise: ExerciseKind,
        options: DriverOptions,
    ) -> (Self, DriverHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let mut driver = Self {
            source,
            recorder,
            session: Session::new(exercise),
            commands: command_rx,
            snapshots: watch::channel(Self::empty_snapshot(exercise)).0,
            options,
            latest_pose: None,
            exhausted: false,
            summary: None,
        };
        let snapshot_rx = driver.snapshots.subscribe();
        driver.publish();
        let handle = DriverHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        };
        (driver, handle)
    }

    fn empty_snapshot(exercise: ExerciseKind) -> Snapshot {
        Snapshot {
            status: SessionStatus::Idle,
            exercise,
            state: ExerciseState::new(),
            pose: None,
            started_at: None,
            elapsed: Duration::ZERO,
            frames: 0,
            source_exhausted: false,
            summary: None,
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.session.status(),
            exercise: self.session.exercise(),
            state: self.session.state().clone(),
            pose: self.latest_pose.clone(),
            started_at: self.session.started_at(),
            elapsed: self.session.elapsed(Instant::now()),
            frames: self.session.frames(),
            source_exhausted: self.exhausted,
            summary: self.summary.clone(),
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }

    fn ticker(&self) -> Option<Interval> {
        self.options.frame_interval.map(|period| {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        })
    }

    /// Runs until `Command::Stop` or until every handle is dropped.
    /// Returns the last published snapshot.
    pub async fn run(mut self) -> Snapshot {
        let mut ticker = self.ticker();
        info!(exercise = %self.session.exercise(), "frame driver running");

        loop {
            if self.session.status() == SessionStatus::Active
                && !self.exhausted
                && self.source.is_exhausted()
            {
                // 取得前に尽きていれば空フレームを処理しない
                self.mark_exhausted();
                self.publish();
            }
            let fetching = self.session.status() == SessionStatus::Active && !self.exhausted;
            let event = if fetching {
                let source = &mut self.source;
                let ticker = &mut ticker;
                tokio::select! {
                    biased;
                    command = self.commands.recv() => Event::Command(command),
                    pose = async move {
                        if let Some(ticker) = ticker.as_mut() {
                            ticker.tick().await;
                        }
                        source.detect_pose().await
                    } => Event::Frame(pose),
                }
            } else {
                Event::Command(self.commands.recv().await)
            };

            match event {
                Event::Command(None) => {
                    debug!("all driver handles dropped");
                    break;
                }
                Event::Command(Some(Command::Stop)) => break,
                Event::Command(Some(command)) => self.apply(command),
                Event::Frame(pose) => self.on_frame(pose),
            }
            self.publish();
        }

        self.source.close().await;
        info!(frames = self.session.frames(), "frame driver stopped");
        let last = self.snapshot();
        self.snapshots.send_replace(last.clone());
        last
    }

    fn on_frame(&mut self, pose: Option<Pose>) {
        if let Err(e) = self.session.process(pose.as_ref()) {
            // select! の優先順位上ここには来ないはずだが、来てもフレームを捨てるだけ
            warn!(error = %e, "frame dropped");
            return;
        }
        self.latest_pose = pose;
        if self.source.is_exhausted() {
            self.mark_exhausted();
        }
    }

    fn mark_exhausted(&mut self) {
        self.exhausted = true;
        info!("pose source exhausted");
        if let Err(e) = self.session.pause(Instant::now()) {
            warn!(error = %e, "could not pause after exhaustion");
        }
    }

    fn apply(&mut self, command: Command) {
        let now = Instant::now();
        let result = match command {
            Command::Start => self.session.start(now),
            Command::Pause => self.session.pause(now),
            Command::Resume => self.session.resume(now),
            Command::TogglePause => self.session.toggle_pause(now),
            Command::SelectExercise(kind) => self.session.select_exercise(kind),
            Command::Reset => self.session.reset(),
            Command::Complete => match self.session.complete(now, Utc::now()) {
                Ok(summary) => {
                    self.finish(summary);
                    Ok(())
                }
                Err(e) => Err(e),
            },
            Command::NewWorkout => {
                self.session.new_workout();
                self.summary = None;
                self.latest_pose = None;
                Ok(())
            }
            Command::Stop => Ok(()),
        };
        if let Err(e) = result {
            warn!(?command, error = %e, "command rejected");
        }
    }

    fn finish(&mut self, summary: WorkoutSummary) {
        if let Err(e) = self.recorder.record(&summary) {
            error!(error = %e, "failed to record workout");
        }
        self.summary = Some(summary);
    }
}

/// Sends commands to a running driver and reads its snapshots.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Snapshot>,
}

impl DriverHandle {
    pub async fn send(&self, command: Command) -> Result<(), DriverError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| DriverError::Closed)
    }

    pub async fn start(&self) -> Result<(), DriverError> {
        self.send(Command::Start).await
    }

    pub async fn pause(&self) -> Result<(), DriverError> {
        self.send(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<(), DriverError> {
        self.send(Command::Resume).await
    }

    pub async fn toggle_pause(&self) -> Result<(), DriverError> {
        self.send(Command::TogglePause).await
    }

    pub async fn select_exercise(&self, kind: ExerciseKind) -> Result<(), DriverError> {
        self.send(Command::SelectExercise(kind)).await
    }

    pub async fn reset(&self) -> Result<(), DriverError> {
        self.send(Command::Reset).await
    }

    pub async fn complete(&self) -> Result<(), DriverError> {
        self.send(Command::Complete).await
    }

    pub async fn new_workout(&self) -> Result<(), DriverError> {
        self.send(Command::NewWorkout).await
    }

    pub async fn stop(&self) -> Result<(), DriverError> {
        self.send(Command::Stop).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Waits until a published snapshot satisfies `predicate`.
    pub async fn wait_for<F>(&self, predicate: F) -> Result<Snapshot, DriverError>
    where
        F: FnMut(&Snapshot) -> bool,
    {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .map_err(|_| DriverError::Closed)?;
        Ok(snapshot.clone())
    }
}
