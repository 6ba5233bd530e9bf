//! Repositories for database operations

pub mod archive;
pub mod request;

pub use archive::ArchiveRepository;
pub use request::RequestRepository;
