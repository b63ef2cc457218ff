//! 種目ごとの判定器
//!
//! 各種目は `detect(pose, prev) -> next` の純粋関数で、`ExerciseKind` の match で選ぶ。
//! 姿勢が無い・品質が低い場合はフィードバック以外を変えない。

pub mod arm_raise;
mod cycle;
pub mod jumping_jack;
pub mod plank;
pub mod pushup;
pub mod squat;
pub mod state;

#[cfg(test)]
pub(crate) mod fixtures;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pose::Pose;

pub use state::{ExerciseState, Phase, INITIAL_FEEDBACK};

/// 対応する5種目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExerciseKind {
    #[default]
    #[serde(rename = "pushup")]
    PushUp,
    Squat,
    JumpingJack,
    Plank,
    ArmRaise,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 5] = [
        Self::PushUp,
        Self::Squat,
        Self::JumpingJack,
        Self::Plank,
        Self::ArmRaise,
    ];

    /// 1フレーム分の状態遷移
    pub fn detect(self, pose: Option<&Pose>, prev: &ExerciseState) -> ExerciseState {
        match self {
            Self::PushUp => pushup::detect(pose, prev),
            Self::Squat => squat::detect(pose, prev),
            Self::JumpingJack => jumping_jack::detect(pose, prev),
            Self::Plank => plank::detect(pose, prev),
            Self::ArmRaise => arm_raise::detect(pose, prev),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PushUp => "pushup",
            Self::Squat => "squat",
            Self::JumpingJack => "jumpingJack",
            Self::Plank => "plank",
            Self::ArmRaise => "armRaise",
        }
    }

    /// 時間保持で数える種目か
    pub fn is_hold(&self) -> bool {
        matches!(self, Self::Plank)
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown exercise: {0} (expected pushup, squat, jumpingJack, plank or armRaise)")]
pub struct UnknownExercise(pub String);

impl FromStr for ExerciseKind {
    type Err = UnknownExercise;

    /// `jumpingJack` / `jumping-jack` / `jumping_jack` のどれでも受け付ける
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "pushup" | "pushups" => Ok(Self::PushUp),
            "squat" | "squats" => Ok(Self::Squat),
            "jumpingjack" | "jumpingjacks" => Ok(Self::JumpingJack),
            "plank" | "planks" => Ok(Self::Plank),
            "armraise" | "armraises" => Ok(Self::ArmRaise),
            _ => Err(UnknownExercise(s.to_string())),
        }
    }
}
