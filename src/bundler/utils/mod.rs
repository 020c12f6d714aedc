//! Archive and file system helpers shared by the bundlers and runtime provisioning.

pub mod archive;
pub mod fs;
