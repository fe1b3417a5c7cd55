pub mod autosave;
pub mod files;
pub mod store;

pub use autosave::AutoSaver;
pub use files::{
    atomic_write, config_file, default_data_dir, ensure_dir, init_local_dir, log_file,
};
pub use store::{JsonFileStore, SnapshotStore};
