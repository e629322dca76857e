//! Database models, one file per table group.
//! Everything is re-exported at `crate::db::models` (and `crate::db`).

pub mod banner;
pub mod datetime;
pub mod family;
pub mod food_product;
pub mod pet;
pub mod records;
pub mod share;
pub mod user;

pub use self::banner::*;
pub use self::family::*;
pub use self::food_product::*;
pub use self::pet::*;
pub use self::records::*;
pub use self::share::*;
pub use self::user::*;
