pub mod store;

pub use store::ClimateDb;
