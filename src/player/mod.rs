// ABOUTME: External player module: locating and spawning mpv, and owning the single running instance
// ABOUTME: The controller enforces at most one player process and reconciles stop requests with process exits

pub mod controller;
pub mod launcher;

pub use controller::PlayerController;
pub use launcher::PlayerLauncher;
