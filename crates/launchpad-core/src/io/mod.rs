//! IO modules - side effects (network, filesystem, subprocesses)

pub mod download;
pub mod extract;
pub mod locate;
pub mod workdir;
