pub mod scrape;
pub mod status;
pub mod validate;
