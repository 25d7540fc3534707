pub mod edgar;
pub mod openfigi;
pub mod sqlite;
