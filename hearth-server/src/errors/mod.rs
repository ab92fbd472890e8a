pub mod auth;
pub mod device;
pub mod house;
pub mod room;
pub mod theme;
pub mod trigger;

pub use auth::AuthError;
pub use device::DeviceError;
pub use house::HouseError;
pub use room::RoomError;
pub use theme::ThemeError;
pub use trigger::TriggerError;
