pub mod geometry;
pub mod keypoint;

pub use geometry::{angle_at_vertex, distance, is_pose_valid, mean_of_sides, MIN_AVERAGE_CONFIDENCE};
pub use keypoint::{get_keypoint, Keypoint, KeypointName, Pose};
