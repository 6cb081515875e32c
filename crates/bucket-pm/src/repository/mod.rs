mod array;
mod provider;
mod traits;

pub use array::*;
pub use provider::*;
pub use traits::*;
