pub mod evaluating;
pub mod running;
