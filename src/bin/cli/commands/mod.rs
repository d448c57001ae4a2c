pub mod cards;
pub mod due;
pub mod sets;
pub mod stats;
pub mod study;
