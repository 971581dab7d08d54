pub mod barcode;
pub mod credential;
pub mod directory;
pub mod identifier;
pub mod verification;
