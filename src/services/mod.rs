pub mod aggregator;
pub mod openweather;
pub mod sampler;
pub mod scheduler;
pub mod store;
