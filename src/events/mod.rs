mod keyboard;
mod pointer;

pub use keyboard::wire_global_keydown;
pub use pointer::wire_orbit_input;
