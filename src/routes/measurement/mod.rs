mod handler;
mod model;

pub use handler::{latest_measurement, save_measurement};
