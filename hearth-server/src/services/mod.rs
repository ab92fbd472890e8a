pub mod auth_service;
pub mod device_service;
pub mod household_service;
pub mod permission_service;
pub mod theme_service;
pub mod token_service;
pub mod trigger_service;
pub mod vendor;

pub use auth_service::AuthService;
pub use device_service::{CascadeReport, DeviceService};
pub use household_service::HouseholdService;
pub use permission_service::PermissionService;
pub use theme_service::{ThemeApplyOutcome, ThemeService};
pub use token_service::TokenService;
pub use trigger_service::TriggerService;
