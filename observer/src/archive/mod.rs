pub mod datafile;

pub use datafile::{datafile_name, ResultArchive};
