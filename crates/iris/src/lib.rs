pub mod attachments;
pub mod errors;
pub mod models;
pub mod providers;
pub mod stream;
pub mod transcript;
