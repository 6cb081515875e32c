//! Package model: concrete packages, aliases and the links between them.

mod alias;
mod link;
#[allow(clippy::module_inception)]
mod package;

pub use alias::AliasPackage;
pub use bucket_semver::Stability;
pub use link::{Link, LinkType};
pub use package::Package;
