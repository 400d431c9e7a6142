pub mod rest;

pub use rest::YahooClient;
