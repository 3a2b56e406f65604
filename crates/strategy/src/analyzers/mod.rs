pub mod fundamentals;
pub mod technical;
