pub mod serialization;
pub mod session;
pub mod store;
pub mod traits;

pub use serialization::*;
pub use session::{spawn_save_worker, BoardSession, SaveReport};
pub use store::*;
pub use traits::*;
