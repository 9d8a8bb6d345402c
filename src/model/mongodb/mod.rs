mod collection;
mod counter;
mod errors;
mod store;

pub use collection::{ensure_indexes_exist, Coll, MongoCollection};
pub use counter::Counter;
pub use errors::is_duplicate_key_error;
pub use store::MongoStore;
