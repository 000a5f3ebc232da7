pub mod check;
pub mod input;
pub mod resolve;
pub mod schema;
pub mod submit;
