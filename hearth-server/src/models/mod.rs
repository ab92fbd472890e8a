pub mod device;
pub mod house;
pub mod room;
pub mod theme;
pub mod token;
pub mod trigger;
pub mod user;

pub use device::{Device, DeviceKind, DeviceTable, TemperatureScale};
pub use house::{House, HouseTable};
pub use room::{Room, RoomTable};
pub use theme::{DeviceSettingValue, Theme, ThemeSetting, ThemeTable};
pub use token::{Token, TokenTable};
pub use trigger::{Trigger, TriggerAction, TriggerEvent, TriggerTable};
pub(crate) use trigger::required_number;
pub use user::{User, UserTable};

pub trait Table {
    /// The name of the table
    fn name(&self) -> &'static str;

    /// The SQL statement to create the table
    fn create(&self) -> String;

    /// The SQL statement to dispose the table
    fn dispose(&self) -> String;

    /// The dependencies of the table
    fn dependencies(&self) -> Vec<&'static str>;
}
