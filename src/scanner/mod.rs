pub mod walker;

pub use walker::{collect_images, WalkOptions};
