pub mod ambience;
pub mod cache;
pub mod camera;
pub mod constants;
pub mod environment;
pub mod keys;
pub mod model;
pub mod orbit;
pub mod particles;
pub mod perf;
pub mod post_plan;
pub mod presets;
pub mod scene;
pub mod settings;
pub mod triggers;
pub mod tween;
pub mod weather;

pub use ambience::*;
pub use camera::*;
pub use constants::*;
pub use environment::*;
pub use keys::*;
pub use orbit::*;
pub use particles::*;
pub use perf::*;
pub use post_plan::*;
pub use presets::*;
pub use scene::*;
pub use settings::*;
pub use triggers::*;
pub use tween::*;
pub use weather::*;

// Shaders bundled as string constants
pub static SCENE_WGSL: &str = include_str!("../../shaders/scene.wgsl");
pub static PARTICLES_WGSL: &str = include_str!("../../shaders/particles.wgsl");
pub static POST_WGSL: &str = include_str!("../../shaders/post.wgsl");
