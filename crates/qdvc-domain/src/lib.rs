#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod hash;
pub mod pointer;
pub mod repository;

pub use hash::{compute_md5, ContentHash, HashError, HASH_ALGORITHM, HASH_HEX_LEN};
pub use pointer::{
    is_pointer_path, logical_name, parse_pointer_hash, pointer_path_for, working_path_for,
    PointerEntry, PointerError, POINTER_EXTENSION,
};
pub use repository::{default_cache_dir, find_dvc_dir, DEFAULT_CACHE_DIR, DVC_DIR};
