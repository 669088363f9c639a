pub mod lines;
pub mod points;
