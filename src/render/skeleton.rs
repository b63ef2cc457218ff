use crate::pose::{Keypoint, KeypointName, Pose};

/// 描画対象とする最低信頼度 (これより大きいもののみ)
pub const DRAW_THRESHOLD: f32 = 0.3;

/// 骨格の接続定義 (開始キーポイント, 終了キーポイント)
pub const SKELETON_CONNECTIONS: [(KeypointName, KeypointName); 16] = [
    // 顔
    (KeypointName::Nose, KeypointName::LeftEye),
    (KeypointName::Nose, KeypointName::RightEye),
    (KeypointName::LeftEye, KeypointName::LeftEar),
    (KeypointName::RightEye, KeypointName::RightEar),
    // 上半身
    (KeypointName::LeftShoulder, KeypointName::RightShoulder),
    (KeypointName::LeftShoulder, KeypointName::LeftElbow),
    (KeypointName::RightShoulder, KeypointName::RightElbow),
    (KeypointName::LeftElbow, KeypointName::LeftWrist),
    (KeypointName::RightElbow, KeypointName::RightWrist),
    // 胴体
    (KeypointName::LeftShoulder, KeypointName::LeftHip),
    (KeypointName::RightShoulder, KeypointName::RightHip),
    (KeypointName::LeftHip, KeypointName::RightHip),
    // 下半身
    (KeypointName::LeftHip, KeypointName::LeftKnee),
    (KeypointName::RightHip, KeypointName::RightKnee),
    (KeypointName::LeftKnee, KeypointName::LeftAnkle),
    (KeypointName::RightKnee, KeypointName::RightAnkle),
];

/// 描画する骨1本
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment<'a> {
    pub from: &'a Keypoint,
    pub to: &'a Keypoint,
}

/// 信頼度が `min_score` を超える関節
pub fn visible_keypoints(pose: &Pose, min_score: f32) -> impl Iterator<Item = &Keypoint> {
    pose.keypoints
        .iter()
        .filter(move |kp| kp.is_visible(min_score))
}

/// 両端とも `min_score` を超える骨
pub fn segments(pose: &Pose, min_score: f32) -> Vec<Segment<'_>> {
    SKELETON_CONNECTIONS
        .iter()
        .filter_map(|&(a, b)| {
            let from = pose.get(a).filter(|kp| kp.is_visible(min_score))?;
            let to = pose.get(b).filter(|kp| kp.is_visible(min_score))?;
            Some(Segment { from, to })
        })
        .collect()
}
