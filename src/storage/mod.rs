pub mod index;
pub mod page;
