pub mod skeleton;

pub use skeleton::{segments, visible_keypoints, Segment, DRAW_THRESHOLD, SKELETON_CONNECTIONS};
