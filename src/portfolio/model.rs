pub mod gain;
pub mod income;
pub mod trade;
