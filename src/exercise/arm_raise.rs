use tracing::debug;

use crate::pose::{is_pose_valid, Keypoint, Pose};

use super::state::{ExerciseState, Phase};

pub const REPOSITION: &str = "Position yourself so your arms and shoulders are visible";
pub const CANNOT_DETECT: &str = "Cannot detect shoulders and arms. Please adjust position.";

/// 手首と肩の高さの余裕 (ピクセル)
const MARGIN: f32 = 20.0;

/// 手首の位置（左右の判定結果）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmLevel {
    /// どちらかの手首が肩より上
    pub above: bool,
    /// 使える側すべての手首が肩より下
    pub below: bool,
}

fn side(shoulder: Option<&Keypoint>, wrist: Option<&Keypoint>) -> Option<(bool, bool)> {
    let (shoulder, wrist) = (shoulder?, wrist?);
    if !shoulder.y.is_finite() || !wrist.y.is_finite() {
        return None;
    }
    // 画像座標は y が下向き
    Some((wrist.y < shoulder.y - MARGIN, wrist.y > shoulder.y + MARGIN))
}

/// 肩と手首が揃っている側だけで判定する。どちらも無ければ None
pub fn arm_level(pose: &Pose) -> Option<ArmLevel> {
    use crate::pose::KeypointName::*;
    let sides: Vec<(bool, bool)> = [
        side(pose.get(LeftShoulder), pose.get(LeftWrist)),
        side(pose.get(RightShoulder), pose.get(RightWrist)),
    ]
    .into_iter()
    .flatten()
    .collect();
    if sides.is_empty() {
        return None;
    }
    Some(ArmLevel {
        above: sides.iter().any(|&(above, _)| above),
        below: sides.iter().all(|&(_, below)| below),
    })
}

pub fn detect(pose: Option<&Pose>, prev: &ExerciseState) -> ExerciseState {
    let pose = match pose {
        Some(pose) if is_pose_valid(Some(pose)) => pose,
        _ => return prev.with_feedback(REPOSITION),
    };
    let Some(level) = arm_level(pose) else {
        return prev.with_feedback(CANNOT_DETECT);
    };

    match prev.phase {
        Phase::Down if level.above => {
            debug!(count = prev.count + 1, "rep completed");
            ExerciseState {
                count: prev.count + 1,
                phase: Phase::Up,
                feedback: "Good! Now lower your arms".to_string(),
                ..prev.clone()
            }
        }
        Phase::Up if level.below => ExerciseState {
            phase: Phase::Down,
            feedback: "Raise your arms again".to_string(),
            ..prev.clone()
        },
        Phase::Neutral if level.below => ExerciseState {
            phase: Phase::Down,
            feedback: "Raise your arms above your shoulders".to_string(),
            ..prev.clone()
        },
        Phase::Neutral if level.above => ExerciseState {
            phase: Phase::Up,
            feedback: "Good! Now lower your arms".to_string(),
            ..prev.clone()
        },
        _ => prev.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::fixtures::{base_pose, remove, set};
    use crate::pose::KeypointName::*;

    /// 肩を y=200 に置き、手首を肩からの相対高さで指定（正が下）
    fn arms(left_dy: f32, right_dy: f32) -> Pose {
        let mut pose = base_pose();
        set(&mut pose, LeftShoulder, 250.0, 200.0);
        set(&mut pose, RightShoulder, 350.0, 200.0);
        set(&mut pose, LeftWrist, 200.0, 200.0 + left_dy);
        set(&mut pose, RightWrist, 400.0, 200.0 + right_dy);
        pose
    }

    fn run(frames: &[(f32, f32)]) -> ExerciseState {
        frames
            .iter()
            .fold(ExerciseState::new(), |state, &(l, r)| detect(Some(&arms(l, r)), &state))
    }

    #[test]
    fn test_single_raise() {
        let state = run(&[(25.0, 25.0), (-25.0, -25.0), (25.0, 25.0)]);
        assert_eq!(state.count, 1);
        assert_eq!(state.phase, Phase::Down);
        assert_eq!(state.feedback, "Raise your arms again");
    }

    #[test]
    fn test_one_arm_up_is_enough() {
        let state = run(&[(25.0, 25.0), (-25.0, 25.0)]);
        assert_eq!(state.count, 1);
    }

    #[test]
    fn test_both_arms_must_be_down() {
        let state = run(&[(25.0, 25.0), (-25.0, -25.0), (25.0, 0.0)]);
        assert_eq!(state.phase, Phase::Up);
        let state = run(&[(25.0, 25.0), (-25.0, -25.0), (25.0, 0.0), (-25.0, -25.0)]);
        assert_eq!(state.count, 1);
    }

    #[test]
    fn test_within_margin_is_ambiguous() {
        let prev = run(&[(25.0, 25.0)]);
        let next = detect(Some(&arms(-15.0, 15.0)), &prev);
        assert_eq!(next, prev);
    }

    #[test]
    fn test_margin_is_strict() {
        let lowered = run(&[(25.0, 25.0)]);
        assert_eq!(detect(Some(&arms(-20.0, -20.0)), &lowered), lowered);
        let raised = run(&[(-25.0, -25.0)]);
        assert_eq!(detect(Some(&arms(20.0, 20.0)), &raised), raised);
    }

    #[test]
    fn test_starting_raised_does_not_count() {
        let state = run(&[(-25.0, -25.0)]);
        assert_eq!(state.count, 0);
        assert_eq!(state.phase, Phase::Up);
    }

    #[test]
    fn test_single_visible_side() {
        let mut down = arms(25.0, 25.0);
        remove(&mut down, &[RightWrist]);
        let mut up = arms(-25.0, 25.0);
        remove(&mut up, &[RightShoulder]);
        let state = detect(Some(&down), &ExerciseState::new());
        assert_eq!(state.phase, Phase::Down);
        let state = detect(Some(&up), &state);
        assert_eq!(state.count, 1);
    }

    #[test]
    fn test_cannot_detect_arms() {
        let mut pose = arms(25.0, 25.0);
        remove(&mut pose, &[LeftWrist, RightShoulder]);
        let state = detect(Some(&pose), &ExerciseState::new());
        assert_eq!(state.feedback, CANNOT_DETECT);
        assert_eq!(state.phase, Phase::Neutral);
    }

    #[test]
    fn test_absent_pose_only_changes_feedback() {
        let prev = run(&[(25.0, 25.0), (-25.0, -25.0)]);
        let next = detect(None, &prev);
        assert_eq!(next, prev.with_feedback(REPOSITION));
    }
}
