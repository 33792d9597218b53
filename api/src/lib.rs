pub mod abi;
pub mod consts;
pub mod error;
pub mod metadata;
pub mod types;

pub mod prelude {
    pub use crate::abi::*;
    pub use crate::consts::*;
    pub use crate::error::*;
    pub use crate::metadata::*;
    pub use crate::types::*;
}
