pub mod list;
pub mod sign;

pub use list::run as list;
pub use sign::run as sign;
