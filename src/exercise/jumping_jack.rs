use tracing::debug;

use crate::pose::{distance, is_pose_valid, Pose};

use super::state::{ExerciseState, Phase};

pub const REPOSITION: &str = "Position yourself so your full body is visible";
pub const CANNOT_DETECT: &str = "Cannot detect limbs. Please adjust position.";

/// 手首間距離 / 肩幅 がこれを超えると開いている
const WRIST_SPREAD_UP: f32 = 2.5;
/// 足首間距離 / 腰幅 がこれを超えると開いている
const ANKLE_SPREAD_UP: f32 = 2.0;
/// 両比率がこれ未満で閉じている
const TOGETHER_BELOW: f32 = 1.5;

/// 体格で正規化した手足の開き
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub wrists: f32,
    pub ankles: f32,
}

impl Spread {
    pub fn is_open(&self) -> bool {
        self.wrists > WRIST_SPREAD_UP && self.ankles > ANKLE_SPREAD_UP
    }

    pub fn is_closed(&self) -> bool {
        self.wrists < TOGETHER_BELOW && self.ankles < TOGETHER_BELOW
    }
}

/// 4つの距離がすべて取れ、かつ基準幅が 0 でないときのみ計算できる
pub fn spread(pose: &Pose) -> Option<Spread> {
    use crate::pose::KeypointName::*;
    let shoulders = distance(pose.get(LeftShoulder), pose.get(RightShoulder))?;
    let wrists = distance(pose.get(LeftWrist), pose.get(RightWrist))?;
    let hips = distance(pose.get(LeftHip), pose.get(RightHip))?;
    let ankles = distance(pose.get(LeftAnkle), pose.get(RightAnkle))?;
    if [shoulders, wrists, hips, ankles].contains(&0.0) {
        return None;
    }
    Some(Spread {
        wrists: wrists / shoulders,
        ankles: ankles / hips,
    })
}

pub fn detect(pose: Option<&Pose>, prev: &ExerciseState) -> ExerciseState {
    let pose = match pose {
        Some(pose) if is_pose_valid(Some(pose)) => pose,
        _ => return prev.with_feedback(REPOSITION),
    };
    let Some(spread) = spread(pose) else {
        return prev.with_feedback(CANNOT_DETECT);
    };

    match prev.phase {
        Phase::Down if spread.is_open() => {
            debug!(?spread, count = prev.count + 1, "rep completed");
            ExerciseState {
                count: prev.count + 1,
                phase: Phase::Up,
                feedback: "Great! Now bring arms and legs back".to_string(),
                ..prev.clone()
            }
        }
        Phase::Up if spread.is_closed() => ExerciseState {
            phase: Phase::Down,
            feedback: "Jump and spread arms!".to_string(),
            ..prev.clone()
        },
        Phase::Neutral if spread.is_closed() => ExerciseState {
            phase: Phase::Down,
            feedback: "Jump and spread your arms and legs".to_string(),
            ..prev.clone()
        },
        Phase::Neutral if spread.is_open() => ExerciseState {
            phase: Phase::Up,
            feedback: "Bring arms and legs back together".to_string(),
            ..prev.clone()
        },
        _ => prev.clone(),
    }
}
