pub mod calculator;
pub mod output;
