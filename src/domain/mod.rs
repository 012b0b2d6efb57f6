pub mod article;
pub mod seed;
