//! Git object types and operations
//!
//! Git stores all content as objects identified by SHA-1 hashes. History
//! reconciliation only ever interprets commits; the other object types are
//! recognised so that a ref pointing at a non-commit can be reported.
//!
//! All objects use the Git object format: `<type> <size>\0<content>`

pub mod commit;
pub mod object;
pub mod object_id;
pub mod object_type;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;

/// Length of a SHA-1 hash in binary format, as stored in pack indexes
pub const RAW_OBJECT_ID_LENGTH: usize = 20;
