pub mod byte_path;
pub mod handle_path;
pub mod retention;
