pub mod extractor;
pub mod jwt;
pub mod payload;
pub mod test_utils;
pub mod validation;
