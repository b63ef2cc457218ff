use crate::pose::{angle_at_vertex, is_pose_valid, mean_of_sides, Pose};

use super::cycle::AngleCycle;
use super::state::ExerciseState;

pub const REPOSITION: &str = "Position yourself so your hips and knees are visible";
pub const CANNOT_DETECT: &str = "Cannot detect knees. Please adjust position.";

const DOWN_BELOW: f32 = 120.0;
const UP_ABOVE: f32 = 160.0;

/// 膝角度 (腰-膝-足首)
const RULES: AngleCycle = AngleCycle {
    down_below: DOWN_BELOW,
    up_above: UP_ABOVE,
    in_progress,
    rep_completed: "Good job! Keep going!",
    went_down: "Now stand up!",
    priming: "Bend your knees to squat down",
    keep_going: "Keep going!",
};

/// 両端を含む
fn in_progress(angle: f32) -> bool {
    (DOWN_BELOW..=UP_ABOVE).contains(&angle)
}

pub fn knee_angle(pose: &Pose) -> Option<f32> {
    use crate::pose::KeypointName::*;
    let left = angle_at_vertex(pose.get(LeftHip), pose.get(LeftKnee), pose.get(LeftAnkle));
    let right = angle_at_vertex(pose.get(RightHip), pose.get(RightKnee), pose.get(RightAnkle));
    mean_of_sides(left, right)
}

pub fn detect(pose: Option<&Pose>, prev: &ExerciseState) -> ExerciseState {
    let pose = match pose {
        Some(pose) if is_pose_valid(Some(pose)) => pose,
        _ => return prev.with_feedback(REPOSITION),
    };
    match knee_angle(pose) {
        Some(angle) => RULES.advance(angle, prev),
        None => prev.with_feedback(CANNOT_DETECT),
    }
}
