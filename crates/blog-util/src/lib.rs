pub mod filename;
pub mod hex;
