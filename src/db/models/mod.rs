// Sub-modules organized by functional domain
pub mod allocation;
pub mod api;
pub mod campaign;
pub mod lead;
pub mod user;

pub use allocation::*;
pub use api::*;
pub use campaign::*;
pub use lead::*;
pub use user::*;
