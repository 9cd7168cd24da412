pub mod imports;
pub mod products;
pub mod webhooks;
