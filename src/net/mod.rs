#[cfg(feature = "http")]
pub mod fetch;
