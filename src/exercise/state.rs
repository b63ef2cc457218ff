use serde::{Deserialize, Serialize};

/// 開始時のフィードバック
pub const INITIAL_FEEDBACK: &str = "Get ready...";

/// 直近に認識した姿勢フェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Up,
    Down,
    /// 最初のフェーズが確定する前のみ
    #[default]
    Neutral,
}

/// フレームごとに検出器を通して更新される状態
///
/// 検出器は常に新しい値を返し、書き換えは行わない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseState {
    /// 完了回数（プランクは保持秒数）
    pub count: u32,
    pub phase: Phase,
    /// 表示用のコーチングメッセージ。判定には使わない
    pub feedback: String,
    /// 姿勢を保持している累積フレーム数（プランクのみ）
    pub timer: u32,
    pub is_in_position: bool,
}

impl ExerciseState {
    pub fn new() -> Self {
        Self {
            count: 0,
            phase: Phase::Neutral,
            feedback: INITIAL_FEEDBACK.to_string(),
            timer: 0,
            is_in_position: false,
        }
    }

    /// フィードバックだけ差し替えた状態
    pub fn with_feedback(&self, feedback: &str) -> Self {
        Self {
            feedback: feedback.to_string(),
            ..self.clone()
        }
    }
}

impl Default for ExerciseState {
    fn default() -> Self {
        Self::new()
    }
}
