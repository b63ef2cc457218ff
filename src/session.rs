//! ワークアウトのライフサイクル
//!
//! `idle → active ⇄ paused → completed`。時刻は呼び出し側から渡すので、
//! 非同期ループから切り離してテストできる。

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::exercise::{ExerciseKind, ExerciseState};
use crate::pose::Pose;
use crate::recorder::{ExerciseTotals, WorkoutSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Active,
    Paused,
    Completed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// 状態遷移を要求する操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Pause,
    Resume,
    SelectExercise,
    Reset,
    Complete,
    ProcessFrame,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::SelectExercise => "select an exercise",
            Self::Reset => "reset",
            Self::Complete => "complete",
            Self::ProcessFrame => "process a frame",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} while {status}")]
    InvalidTransition {
        status: SessionStatus,
        action: Action,
    },
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// 1回のワークアウト。状態を書き換えるのはこの型だけ
#[derive(Debug, Clone)]
pub struct Session {
    exercise: ExerciseKind,
    state: ExerciseState,
    status: SessionStatus,
    started_at: Option<DateTime<Utc>>,
    /// 一時停止までに積算したアクティブ時間
    accumulated: Duration,
    /// 現在のアクティブ区間の開始
    resumed_at: Option<Instant>,
    frames: u64,
}

impl Session {
    pub fn new(exercise: ExerciseKind) -> Self {
        Self {
            exercise,
            state: ExerciseState::new(),
            status: SessionStatus::Idle,
            started_at: None,
            accumulated: Duration::ZERO,
            resumed_at: None,
            frames: 0,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn exercise(&self) -> ExerciseKind {
        self.exercise
    }

    pub fn state(&self) -> &ExerciseState {
        &self.state
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// 処理したフレーム数（リセットや種目変更では戻らない）
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// 一時停止中を除いた経過時間
    pub fn elapsed(&self, now: Instant) -> Duration {
        let running = self
            .resumed_at
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default();
        self.accumulated + running
    }

    fn reject(&self, action: Action) -> SessionError {
        SessionError::InvalidTransition {
            status: self.status,
            action,
        }
    }

    pub fn start(&mut self, now: Instant) -> SessionResult<()> {
        if self.status != SessionStatus::Idle {
            return Err(self.reject(Action::Start));
        }
        self.started_at = Some(Utc::now());
        self.resumed_at = Some(now);
        self.status = SessionStatus::Active;
        info!(exercise = %self.exercise, "workout started");
        Ok(())
    }

    pub fn pause(&mut self, now: Instant) -> SessionResult<()> {
        if self.status != SessionStatus::Active {
            return Err(self.reject(Action::Pause));
        }
        self.accumulated = self.elapsed(now);
        self.resumed_at = None;
        self.status = SessionStatus::Paused;
        info!(elapsed_secs = self.accumulated.as_secs(), "paused");
        Ok(())
    }

    pub fn resume(&mut self, now: Instant) -> SessionResult<()> {
        if self.status != SessionStatus::Paused {
            return Err(self.reject(Action::Resume));
        }
        self.resumed_at = Some(now);
        self.status = SessionStatus::Active;
        info!("resumed");
        Ok(())
    }

    /// active と paused を切り替える
    pub fn toggle_pause(&mut self, now: Instant) -> SessionResult<()> {
        match self.status {
            SessionStatus::Active => self.pause(now),
            SessionStatus::Paused => self.resume(now),
            _ => Err(self.reject(Action::Pause)),
        }
    }

    /// 種目を切り替える。回数は常に初期化され、前の種目の回数は失われる
    pub fn select_exercise(&mut self, exercise: ExerciseKind) -> SessionResult<()> {
        if self.status == SessionStatus::Completed {
            return Err(self.reject(Action::SelectExercise));
        }
        if self.state.count > 0 && exercise != self.exercise {
            info!(from = %self.exercise, dropped = self.state.count, "discarding count on switch");
        }
        self.exercise = exercise;
        self.state = ExerciseState::new();
        info!(exercise = %exercise, "exercise selected");
        Ok(())
    }

    /// 現在の種目の状態だけを初期化する。経過時間はそのまま
    pub fn reset(&mut self) -> SessionResult<()> {
        if self.status == SessionStatus::Completed {
            return Err(self.reject(Action::Reset));
        }
        self.state = ExerciseState::new();
        info!(exercise = %self.exercise, "exercise reset");
        Ok(())
    }

    /// 1フレーム分を選択中の判定器に通す
    pub fn process(&mut self, pose: Option<&Pose>) -> SessionResult<&ExerciseState> {
        if self.status != SessionStatus::Active {
            return Err(self.reject(Action::ProcessFrame));
        }
        let next = self.exercise.detect(pose, &self.state);
        if next.count > self.state.count {
            info!(exercise = %self.exercise, count = next.count, "count");
        }
        self.state = next;
        self.frames += 1;
        Ok(&self.state)
    }

    /// ワークアウトを終了し、記録用のサマリーを作る
    pub fn complete(&mut self, now: Instant, date: DateTime<Utc>) -> SessionResult<WorkoutSummary> {
        if !matches!(self.status, SessionStatus::Active | SessionStatus::Paused) {
            return Err(self.reject(Action::Complete));
        }
        self.accumulated = self.elapsed(now);
        self.resumed_at = None;
        self.status = SessionStatus::Completed;
        let summary = WorkoutSummary {
            date,
            duration: self.accumulated.as_secs(),
            exercises: ExerciseTotals::single(self.exercise, self.state.count),
        };
        info!(
            exercise = %self.exercise,
            count = self.state.count,
            duration = summary.duration,
            "workout completed"
        );
        Ok(summary)
    }

    /// どの状態からでも idle に戻し、時間と状態を初期化する
    pub fn new_workout(&mut self) {
        *self = Self::new(self.exercise);
        info!("new workout");
    }
}
