//! MongoDB server error codes the driver has no constants for.

use mongodb::error::{Error as DbError, ErrorKind, WriteFailure};

pub const DUPLICATE_KEY: i32 = 11000;

/// Return true if the given error is a duplicate key write error.
pub fn is_duplicate_key_error(err: &DbError) -> bool {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(ref e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}
