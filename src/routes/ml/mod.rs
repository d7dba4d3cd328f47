mod handler;

pub use handler::predict;
