mod storage_error;
mod tally_error;

pub use storage_error::StorageError;
pub use tally_error::{TallyError, TallyResult};
