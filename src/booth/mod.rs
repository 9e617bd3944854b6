mod controller;
mod slideshow;
#[cfg(test)]
mod tests;

pub use controller::{BoothController, SHUTDOWN_MESSAGE};
pub use slideshow::Slideshow;
