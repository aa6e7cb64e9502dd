//! Feature modules built on the host and storage capabilities

pub mod translator;
