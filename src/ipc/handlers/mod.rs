pub mod campers;
pub mod core;
pub mod imports;
pub mod incidents;
