//! 関節角度の屈伸サイクルで数える種目（腕立て伏せ・スクワット）の共通ルール

use tracing::debug;

use super::state::{ExerciseState, Phase};

/// 角度サイクル種目のルール表
pub struct AngleCycle {
    /// これ未満で down
    pub down_below: f32,
    /// これを超えると up
    pub up_above: f32,
    /// 途中の角度とみなす範囲（境界の扱いは種目ごとに異なる）
    pub in_progress: fn(f32) -> bool,
    pub rep_completed: &'static str,
    pub went_down: &'static str,
    pub priming: &'static str,
    pub keep_going: &'static str,
}

impl AngleCycle {
    /// 平均角度から次の状態を決める。最初に一致した規則のみ適用
    pub fn advance(&self, angle: f32, prev: &ExerciseState) -> ExerciseState {
        if angle > self.up_above && prev.phase == Phase::Down {
            debug!(angle, count = prev.count + 1, "rep completed");
            ExerciseState {
                count: prev.count + 1,
                phase: Phase::Up,
                feedback: self.rep_completed.to_string(),
                ..prev.clone()
            }
        } else if angle < self.down_below && prev.phase != Phase::Down {
            debug!(angle, "phase -> down");
            ExerciseState {
                phase: Phase::Down,
                feedback: self.went_down.to_string(),
                ..prev.clone()
            }
        } else if angle > self.up_above && prev.phase == Phase::Neutral {
            debug!(angle, "starting position");
            ExerciseState {
                phase: Phase::Up,
                feedback: self.priming.to_string(),
                ..prev.clone()
            }
        } else if (self.in_progress)(angle) {
            prev.with_feedback(self.keep_going)
        } else {
            prev.clone()
        }
    }
}
