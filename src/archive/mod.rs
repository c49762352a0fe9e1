pub mod dataset_archive;

pub use dataset_archive::DatasetArchive;
