//! ワークアウト完了時のサマリーと記録先

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::exercise::ExerciseKind;

/// 種目ごとの回数。完了時に選択中だった種目以外は 0
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseTotals {
    pub pushups: u32,
    pub squats: u32,
    pub jumping_jacks: u32,
    /// プランク保持秒数
    pub planks: u32,
    pub arm_raises: u32,
}

impl ExerciseTotals {
    pub fn single(kind: ExerciseKind, count: u32) -> Self {
        let mut totals = Self::default();
        *totals.slot_mut(kind) = count;
        totals
    }

    pub fn get(&self, kind: ExerciseKind) -> u32 {
        match kind {
            ExerciseKind::PushUp => self.pushups,
            ExerciseKind::Squat => self.squats,
            ExerciseKind::JumpingJack => self.jumping_jacks,
            ExerciseKind::Plank => self.planks,
            ExerciseKind::ArmRaise => self.arm_raises,
        }
    }

    fn slot_mut(&mut self, kind: ExerciseKind) -> &mut u32 {
        match kind {
            ExerciseKind::PushUp => &mut self.pushups,
            ExerciseKind::Squat => &mut self.squats,
            ExerciseKind::JumpingJack => &mut self.jumping_jacks,
            ExerciseKind::Plank => &mut self.planks,
            ExerciseKind::ArmRaise => &mut self.arm_raises,
        }
    }
}

/// 記録先に渡す1回分のワークアウト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSummary {
    /// 完了時刻 (RFC 3339)
    pub date: DateTime<Utc>,
    /// 一時停止を除いた経過秒数
    pub duration: u64,
    pub exercises: ExerciseTotals,
}

/// 完了したワークアウトの保存先
///
/// ユーザーとの紐付けや保存形式は実装側の責務。
pub trait WorkoutRecorder: Send {
    fn record(&mut self, summary: &WorkoutSummary) -> Result<()>;
}

/// サマリーを JSON でログに出すだけの記録先
#[derive(Debug, Default)]
pub struct LogRecorder {
    recorded: usize,
}

impl LogRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> usize {
        self.recorded
    }
}

impl WorkoutRecorder for LogRecorder {
    fn record(&mut self, summary: &WorkoutSummary) -> Result<()> {
        let json = serde_json::to_string(summary)?;
        self.recorded += 1;
        info!(summary = %json, "workout recorded");
        Ok(())
    }
}

impl<R: WorkoutRecorder + ?Sized> WorkoutRecorder for Box<R> {
    fn record(&mut self, summary: &WorkoutSummary) -> Result<()> {
        (**self).record(summary)
    }
}
