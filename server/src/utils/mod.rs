pub mod json;
pub mod path;
pub mod retry;
pub mod string;
pub mod time;
