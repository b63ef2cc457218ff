//! テスト用の姿勢生成ヘルパー

use crate::pose::{Keypoint, KeypointName, Pose};

pub const SCORE: f32 = 0.9;

/// 全 17 点が原点にあり信頼度 0.9 の姿勢
pub fn base_pose() -> Pose {
    Pose::new(
        KeypointName::ALL
            .iter()
            .map(|&name| Keypoint::new(name, 0.0, 0.0, SCORE))
            .collect(),
    )
}

pub fn set(pose: &mut Pose, name: KeypointName, x: f32, y: f32) {
    if let Some(kp) = pose.keypoints.iter_mut().find(|kp| kp.name == name) {
        kp.x = x;
        kp.y = y;
    }
}

pub fn remove(pose: &mut Pose, names: &[KeypointName]) {
    pose.keypoints.retain(|kp| !names.contains(&kp.name));
}

/// 頂点 `b` を (cx, 200) に置き、a→b→c の角度が `angle` 度になるよう配置
pub fn place_joint(
    pose: &mut Pose,
    (a, b, c): (KeypointName, KeypointName, KeypointName),
    cx: f32,
    angle: f32,
) {
    let rad = angle.to_radians();
    set(pose, a, cx, 100.0);
    set(pose, b, cx, 200.0);
    set(pose, c, cx + 100.0 * rad.sin(), 200.0 - 100.0 * rad.cos());
}

/// 左右両側を同じ角度で配置した姿勢
pub fn symmetric_pose(
    left: (KeypointName, KeypointName, KeypointName),
    right: (KeypointName, KeypointName, KeypointName),
    angle: f32,
) -> Pose {
    let mut pose = base_pose();
    place_joint(&mut pose, left, 200.0, angle);
    place_joint(&mut pose, right, 400.0, angle);
    pose
}
