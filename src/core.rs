//! Domain logic: the host capability model, persistent storage, traversal and
//! the features built on them

pub mod features;
pub mod host;
pub mod storage;
pub mod traverse;
