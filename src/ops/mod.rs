pub mod columns;
pub mod filter;
pub mod search;
pub mod session;
pub mod transition;
