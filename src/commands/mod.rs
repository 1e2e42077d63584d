//! Command implementations

mod attestations;
mod authorize;
mod gate;
mod init;
mod keys;
mod run;

pub use attestations::attestations;
pub use authorize::authorize;
pub use gate::gate;
pub use init::init;
pub use keys::keys;
pub use run::run_pipeline;
