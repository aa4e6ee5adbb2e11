pub mod audit;
pub mod health;
pub mod probe;
pub mod uploads;
