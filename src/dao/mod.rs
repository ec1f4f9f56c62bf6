/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
/// Tournament, score and player directory persistence.
pub mod tournament_store;
