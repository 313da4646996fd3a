pub mod archive;
pub mod catalog;
pub mod state_file;

pub use archive::DirArchive;
pub use catalog::CsvCatalog;
pub use state_file::JsonStateStore;
