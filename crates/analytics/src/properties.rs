//! Well-known GA4 export property paths
//!
//! Constants for the standard columns, plus helpers for custom event
//! parameters and user properties. Every path here parses as a
//! [`Property`](crate::property::Property).

use crate::property::{EVENT_PARAMS, USER_PROPERTIES};

/// Platform the event came from (`WEB`, `ANDROID`, `IOS`)
pub const PLATFORM: &str = "platform";

/// Geography derived from the event's IP address
pub mod geo {
    pub const COUNTRY: &str = "geo.country";
    pub const REGION: &str = "geo.region";
    pub const CITY: &str = "geo.city";
}

/// Device information
pub mod device {
    pub const CATEGORY: &str = "device.category";
    pub const MOBILE_BRAND_NAME: &str = "device.mobile_brand_name";
    pub const MOBILE_MODEL_NAME: &str = "device.mobile_model_name";
    pub const MOBILE_MARKETING_NAME: &str = "device.mobile_marketing_name";
    pub const LANGUAGE: &str = "device.language";
}

/// App information
pub mod app_info {
    pub const VERSION: &str = "app_info.version";
}

/// Path for a custom event parameter
pub fn event_param(key: &str) -> String {
    format!("{}.{}", EVENT_PARAMS, key)
}

/// Path for a custom user property
pub fn user_property(key: &str) -> String {
    format!("{}.{}", USER_PROPERTIES, key)
}
