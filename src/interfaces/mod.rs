pub mod cli;
pub mod middleware;
