use tracing::debug;

use crate::pose::{angle_at_vertex, is_pose_valid, mean_of_sides, Pose};

use super::state::ExerciseState;

pub const REPOSITION: &str = "Position yourself in a plank pose";
pub const CANNOT_DETECT: &str = "Cannot detect body alignment. Please adjust position.";

/// 保持 1 単位あたりのフレーム数（30fps で約1秒）
pub const FRAMES_PER_UNIT: u32 = 30;
/// この保持フレーム数からフィードバックを切り替える
const PRAISE_AFTER_FRAMES: u32 = 90;
/// 体幹ラインがこれを超えればまっすぐ
const STRAIGHT_ABOVE: f32 = 160.0;
/// 逆向きに測った場合のまっすぐ
const STRAIGHT_BELOW: f32 = 20.0;

/// 体幹ライン角度 (肩-腰-足首)
pub fn body_line_angle(pose: &Pose) -> Option<f32> {
    use crate::pose::KeypointName::*;
    let left = angle_at_vertex(pose.get(LeftShoulder), pose.get(LeftHip), pose.get(LeftAnkle));
    let right = angle_at_vertex(pose.get(RightShoulder), pose.get(RightHip), pose.get(RightAnkle));
    mean_of_sides(left, right)
}

/// 両向きのどちらかでほぼ一直線か
///
/// `< 20°` 側は退化した姿勢でも通ることがあるが、閾値はそのまま残す。
pub fn is_straight(angle: f32) -> bool {
    angle > STRAIGHT_ABOVE || angle < STRAIGHT_BELOW
}

pub fn detect(pose: Option<&Pose>, prev: &ExerciseState) -> ExerciseState {
    let pose = match pose {
        Some(pose) if is_pose_valid(Some(pose)) => pose,
        _ => return prev.with_feedback(REPOSITION),
    };
    let Some(angle) = body_line_angle(pose) else {
        return prev.with_feedback(CANNOT_DETECT);
    };

    if !is_straight(angle) {
        return ExerciseState {
            is_in_position: false,
            feedback: "Keep your body straight in plank position".to_string(),
            ..prev.clone()
        };
    }

    let timer = prev.timer + 1;
    let count = if timer % FRAMES_PER_UNIT == 0 {
        debug!(timer, "plank unit held");
        timer / FRAMES_PER_UNIT
    } else {
        prev.count
    };
    let feedback = if timer < PRAISE_AFTER_FRAMES {
        "Hold the plank position"
    } else {
        "Great job! Keep holding"
    };
    ExerciseState {
        count,
        timer,
        is_in_position: true,
        feedback: feedback.to_string(),
        ..prev.clone()
    }
}
