// Requester side of the arithmetic protocol

pub mod requester;

pub use requester::{Reply, Requester};
