// ── Domain model ──

pub mod entity;
pub mod identity;
pub mod row;

pub use entity::{
    EntityAttributes, PRESENCE_LABEL, PresenceEntity, PresenceState, RouterDevice, SOURCE_TYPE,
};
pub use identity::{MacAddress, ip_sort_key};
pub use row::DeviceRow;
