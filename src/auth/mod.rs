pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod model;

#[cfg(test)]
mod tests;
