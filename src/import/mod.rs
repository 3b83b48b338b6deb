pub mod commit;
pub mod map;
pub mod parse;
pub mod report;
pub mod schema;
pub mod session;
pub mod validate;
