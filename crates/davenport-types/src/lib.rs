//! Shared protocol value types for the davenport daemon.
//!
//! This crate holds the two addressing primitives the rest of the system is
//! built on: [`DavPath`], the hierarchical resource path every tree lookup
//! and route descent uses, and [`Method`], the normalised HTTP/WebDAV verb
//! the dispatch table keys on. Both are plain value types with no I/O so
//! that resource-tree implementations and protocol handlers can depend on
//! them without pulling in the daemon.

mod method;
mod path;

pub use method::Method;
pub use path::DavPath;
