use serde::{Deserialize, Serialize};

/// MoveNet の 17 キーポイント名
///
/// シリアライズ形式は TF.js の `name` フィールド (`left_shoulder` など)。
/// 判別子は MoveNet 出力のインデックスと一致する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum KeypointName {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointName {
    pub const COUNT: usize = 17;

    pub const ALL: [KeypointName; KeypointName::COUNT] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

/// 単一キーポイント
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// X座標 (ピクセル)
    pub x: f32,
    /// Y座標 (ピクセル、下向きが正)
    pub y: f32,
    /// 信頼度スコア (0.0〜1.0)。検出器が出さない場合は None
    #[serde(default)]
    pub score: Option<f32>,
    pub name: KeypointName,
}

impl Keypoint {
    pub fn new(name: KeypointName, x: f32, y: f32, score: f32) -> Self {
        Self {
            x,
            y,
            score: Some(score),
            name,
        }
    }

    /// スコアなしは 0 として扱う
    pub fn confidence(&self) -> f32 {
        self.score.unwrap_or(0.0)
    }

    /// 信頼度が閾値を超えるか
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.confidence() > threshold
    }
}

/// 1人分の姿勢。キーポイントは検出器の出力順
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub keypoints: Vec<Keypoint>,
    /// 姿勢全体のスコア（複数人検出時の選択に使う）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Pose {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self {
            keypoints,
            score: None,
        }
    }

    /// 名前でキーポイントを線形探索
    pub fn get(&self, name: KeypointName) -> Option<&Keypoint> {
        self.keypoints.iter().find(|kp| kp.name == name)
    }

    /// 全キーポイントの平均信頼度。キーポイントが無ければ None
    pub fn average_confidence(&self) -> Option<f32> {
        if self.keypoints.is_empty() {
            return None;
        }
        // f32 のまま足すと 17 点の丸め誤差で閾値ちょうどの判定がぶれる
        let sum: f64 = self.keypoints.iter().map(|kp| kp.confidence() as f64).sum();
        Some((sum / self.keypoints.len() as f64) as f32)
    }

    /// 複数の候補から1人を選ぶ。スコア最大、同点・スコアなしは先頭
    pub fn select_primary(poses: Vec<Pose>) -> Option<Pose> {
        let mut best: Option<Pose> = None;
        for pose in poses {
            let replace = match (&best, pose.score) {
                (None, _) => true,
                (Some(current), Some(score)) => score > current.score.unwrap_or(f32::NEG_INFINITY),
                (Some(_), None) => false,
            };
            if replace {
                best = Some(pose);
            }
        }
        best
    }
}

/// `pose` が無い場合も None を返す名前引き
pub fn get_keypoint(pose: Option<&Pose>, name: KeypointName) -> Option<&Keypoint> {
    pose?.get(name)
}
