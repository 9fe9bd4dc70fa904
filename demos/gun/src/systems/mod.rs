pub mod collisions;
pub mod kickback;
pub mod targets;
pub mod triggers;

pub use collisions::{collisions_system, delete_hit};
pub use kickback::{kickback_system, play_load_sound, start_kickback, take_firing_pose};
pub use targets::{launch_button_system, launch_target, schedule_target};
pub use triggers::{fire_from_camera, shoot_bullet, triggers_system};
