pub mod exchange;
pub mod offer;
pub mod wallet;
