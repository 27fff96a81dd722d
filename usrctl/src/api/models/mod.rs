pub mod pagination;
pub mod profiles;
