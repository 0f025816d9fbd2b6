pub mod anchor;
pub mod fill;
pub mod layers;
