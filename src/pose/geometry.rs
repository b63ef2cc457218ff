//! 2D 幾何プリミティブと姿勢品質ゲート
//!
//! どの関数も欠損キーポイントや NaN を None で返す。判定ルールには有限値しか渡らない。

use super::keypoint::{Keypoint, Pose};

/// 姿勢を有効とみなす平均信頼度（この値を超える必要がある）
pub const MIN_AVERAGE_CONFIDENCE: f32 = 0.3;

/// 頂点 `b` における角度（度, 0〜180）
///
/// b→a と b→c の方位角 (atan2) の差から求め、180 を超えたら 360 から引く。
/// 向きに依存しないのでカメラの左右反転に影響されない。
/// 頂点と重なる点は方位 0 として扱い、除外しない。
pub fn angle_at_vertex(
    a: Option<&Keypoint>,
    b: Option<&Keypoint>,
    c: Option<&Keypoint>,
) -> Option<f32> {
    let (a, b, c) = (a?, b?, c?);
    let radians = f32::atan2(c.y - b.y, c.x - b.x) - f32::atan2(a.y - b.y, a.x - b.x);
    let mut angle = radians.to_degrees().abs();
    if angle > 180.0 {
        angle = 360.0 - angle;
    }
    angle.is_finite().then_some(angle)
}

/// ユークリッド距離
pub fn distance(a: Option<&Keypoint>, b: Option<&Keypoint>) -> Option<f32> {
    let (a, b) = (a?, b?);
    let d = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
    d.is_finite().then_some(d)
}

/// 平均信頼度による全体ゲート
///
/// キーポイント単位ではなく全身の平均で判定する。下半身だけを使う種目でも
/// 上半身のノイズで弾かれることがあるが、これは既知の制約として残している。
pub fn is_pose_valid(pose: Option<&Pose>) -> bool {
    pose.and_then(Pose::average_confidence)
        .is_some_and(|avg| avg > MIN_AVERAGE_CONFIDENCE)
}

/// 左右の値の平均。片側のみならその値、両側なしなら None
pub fn mean_of_sides(left: Option<f32>, right: Option<f32>) -> Option<f32> {
    match (left, right) {
        (Some(l), Some(r)) => Some((l + r) / 2.0),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}
