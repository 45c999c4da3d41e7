pub mod email;
pub mod postgres;
pub mod site;
