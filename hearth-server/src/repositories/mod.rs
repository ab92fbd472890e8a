mod device;
mod house;
mod room;
mod theme;
mod token;
mod trigger;
mod user;

pub use device::DeviceRepository;
pub use house::HouseRepository;
pub use room::RoomRepository;
pub use theme::ThemeRepository;
pub use token::TokenRepository;
pub use trigger::TriggerRepository;
pub use user::UserRepository;
