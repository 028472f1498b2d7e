pub mod candle;
pub mod error;
pub mod loader;
pub mod parser;
pub mod series;
pub mod timestamp;
