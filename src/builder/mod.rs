//! Native bridge build configuration.
//!
//! Discovers the compile and link flags of a xapian-core tree and splices
//! them into the bridge build template.

pub mod config_header;
pub mod errors;
pub mod fingerprint;
pub mod flags;
pub mod libtool;
pub mod pkgconfig;
pub mod splice;

pub use errors::{ConfigError, SpliceError};
pub use fingerprint::BridgeFingerprint;
pub use flags::{assemble, CoreMode, FlagRequest, FlagSet, Stage};
pub use pkgconfig::{locate_descriptor, PkgConfigFile};
pub use splice::{splice, splice_into, DirectiveStyle, SplicedTree};
