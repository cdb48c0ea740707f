pub mod products;
pub mod uploads;
