pub mod debounce;
pub mod files;
pub mod state;

pub use debounce::PersistDebouncer;
pub use files::{ensure_dir, init_local_data_dir, resolve_data_dir, LOG_FILE_NAME};
pub use state::{FileStorage, PersistedState, Storage};
