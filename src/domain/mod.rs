pub mod balance_change;
pub mod ids;
pub mod key;
pub mod ports;
pub mod records;
pub mod response;
pub mod side_effects;
