pub mod extract;
pub mod input;
pub mod locate;
pub mod map;
pub mod sections;
