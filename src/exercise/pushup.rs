use crate::pose::{angle_at_vertex, is_pose_valid, mean_of_sides, Pose};

use super::cycle::AngleCycle;
use super::state::ExerciseState;

pub const REPOSITION: &str = "Position yourself so your shoulders and arms are visible";
pub const CANNOT_DETECT: &str = "Cannot detect elbows. Please adjust position.";

const DOWN_BELOW: f32 = 90.0;
const UP_ABOVE: f32 = 160.0;

/// 肘角度 (肩-肘-手首)
const RULES: AngleCycle = AngleCycle {
    down_below: DOWN_BELOW,
    up_above: UP_ABOVE,
    in_progress,
    rep_completed: "Good job! Keep going!",
    went_down: "Now push up!",
    priming: "Lower your body by bending your elbows",
    keep_going: "Keep going!",
};

/// 両端を含まない
fn in_progress(angle: f32) -> bool {
    angle > DOWN_BELOW && angle < UP_ABOVE
}

/// 左右の肘角度の平均（片側のみならその値）
pub fn elbow_angle(pose: &Pose) -> Option<f32> {
    use crate::pose::KeypointName::*;
    let left = angle_at_vertex(pose.get(LeftShoulder), pose.get(LeftElbow), pose.get(LeftWrist));
    let right = angle_at_vertex(
        pose.get(RightShoulder),
        pose.get(RightElbow),
        pose.get(RightWrist),
    );
    mean_of_sides(left, right)
}

pub fn detect(pose: Option<&Pose>, prev: &ExerciseState) -> ExerciseState {
    let pose = match pose {
        Some(pose) if is_pose_valid(Some(pose)) => pose,
        _ => return prev.with_feedback(REPOSITION),
    };
    match elbow_angle(pose) {
        Some(angle) => RULES.advance(angle, prev),
        None => prev.with_feedback(CANNOT_DETECT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::fixtures::{place_joint, remove, symmetric_pose};
    use crate::exercise::state::Phase;
    use crate::pose::KeypointName::{self, *};

    const LEFT: (KeypointName, KeypointName, KeypointName) = (LeftShoulder, LeftElbow, LeftWrist);
    const RIGHT: (KeypointName, KeypointName, KeypointName) = (RightShoulder, RightElbow, RightWrist);

    fn arms(angle: f32) -> Pose {
        symmetric_pose(LEFT, RIGHT, angle)
    }

    fn run(angles: &[f32]) -> ExerciseState {
        angles
            .iter()
            .fold(ExerciseState::new(), |state, &a| detect(Some(&arms(a)), &state))
    }

    #[test]
    fn test_single_rep() {
        let state = run(&[170.0, 80.0, 170.0]);
        assert_eq!(state.count, 1);
        assert_eq!(state.phase, Phase::Up);
        assert_eq!(state.feedback, "Good job! Keep going!");
    }

    #[test]
    fn test_starting_position_does_not_count() {
        let state = run(&[170.0]);
        assert_eq!(state.count, 0);
        assert_eq!(state.phase, Phase::Up);
        assert_eq!(state.feedback, "Lower your body by bending your elbows");
    }

    #[test]
    fn test_going_down_does_not_count() {
        let state = run(&[170.0, 80.0, 80.0]);
        assert_eq!(state.count, 0);
        assert_eq!(state.phase, Phase::Down);
        assert_eq!(state.feedback, "Now push up!");
    }

    #[test]
    fn test_repeated_up_frames_count_once() {
        let state = run(&[170.0, 80.0, 170.0, 175.0, 170.0]);
        assert_eq!(state.count, 1);
    }

    #[test]
    fn test_in_progress_feedback() {
        let state = run(&[170.0, 120.0]);
        assert_eq!(state.phase, Phase::Up);
        assert_eq!(state.feedback, "Keep going!");
    }

    fn down_state() -> ExerciseState {
        ExerciseState {
            phase: Phase::Down,
            feedback: "Now push up!".to_string(),
            ..ExerciseState::new()
        }
    }

    #[test]
    fn test_up_threshold_is_strict() {
        let prev = down_state();
        let next = RULES.advance(160.0, &prev);
        assert_eq!(next, prev);
        assert_eq!(RULES.advance(160.01, &prev).count, 1);
    }

    #[test]
    fn test_down_threshold_is_strict() {
        let prev = ExerciseState::new();
        let next = RULES.advance(90.0, &prev);
        assert_eq!(next, prev);
        assert_eq!(RULES.advance(89.99, &prev).phase, Phase::Down);
    }

    #[test]
    fn test_in_progress_excludes_thresholds() {
        let up = ExerciseState {
            phase: Phase::Up,
            ..ExerciseState::new()
        };
        for angle in [90.0, 160.0] {
            assert_ne!(RULES.advance(angle, &up).feedback, "Keep going!", "{angle}");
        }
        assert_eq!(RULES.advance(90.01, &up).feedback, "Keep going!");
        assert_eq!(RULES.advance(159.99, &up).feedback, "Keep going!");
    }

    #[test]
    fn test_one_side_is_enough() {
        let mut down = arms(80.0);
        remove(&mut down, &[RightWrist]);
        let mut up = arms(170.0);
        remove(&mut up, &[LeftElbow]);
        let state = detect(Some(&down), &ExerciseState::new());
        let state = detect(Some(&up), &state);
        assert_eq!(state.count, 1);
    }

    #[test]
    fn test_sides_are_averaged() {
        // 左 60° 右 140° → 平均 100° は down 閾値に届かない
        let mut pose = arms(60.0);
        place_joint(&mut pose, RIGHT, 400.0, 140.0);
        let angle = elbow_angle(&pose).unwrap();
        assert!((angle - 100.0).abs() < 0.01);
        let state = detect(Some(&pose), &ExerciseState::new());
        assert_eq!(state.phase, Phase::Neutral);
    }

    #[test]
    fn test_cannot_detect_elbows() {
        let mut pose = arms(170.0);
        remove(&mut pose, &[LeftElbow, RightElbow]);
        // 2点欠けても平均信頼度は 15/15 で有効
        let state = detect(Some(&pose), &ExerciseState::new());
        assert_eq!(state.feedback, CANNOT_DETECT);
        assert_eq!(state.phase, Phase::Neutral);
    }

    #[test]
    fn test_absent_pose_only_changes_feedback() {
        let prev = run(&[170.0, 80.0]);
        let next = detect(None, &prev);
        assert_eq!(next.feedback, REPOSITION);
        assert_eq!(next, prev.with_feedback(REPOSITION));
    }
}
