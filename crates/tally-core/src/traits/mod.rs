mod storage;

pub use storage::{ITallyStorage, StorageHealth};
