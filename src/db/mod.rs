//! Database layer (hosted platform row endpoint).

pub mod platform;

pub use platform::PlatformDb;

/// Table names as constants.
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const SMS_TEMPLATES: &str = "sms_templates";
}
