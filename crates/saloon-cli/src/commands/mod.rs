pub mod play;
pub mod rules;
pub mod simulate;
