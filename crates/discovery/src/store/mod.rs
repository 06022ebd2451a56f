mod error;
#[cfg(feature = "etcd")]
mod etcd;
mod interface;
mod memory;
mod node;

pub use error::*;
#[cfg(feature = "etcd")]
pub use etcd::*;
pub use interface::*;
pub use memory::*;
pub use node::*;
