/// Game row storage behind the scoring sessions.
pub mod game_store;
/// Storage abstraction layer errors.
pub mod storage;
