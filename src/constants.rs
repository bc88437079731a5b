/// User agent string for HTTP requests
pub const USER_AGENT: &str = concat!("qweather-mcp-server/", env!("CARGO_PKG_VERSION"));

/// QWeather API base URL
pub const DEFAULT_API_HOST: &str = "https://devapi.qweather.com";

/// Seconds subtracted from "now" when stamping `iat`, to tolerate clock skew
pub const CLOCK_SKEW_SECS: u64 = 30;

/// Lifetime of a minted token, counted from `iat`
pub const TOKEN_TTL_SECS: u64 = 900;

/// Line terminating every rendered record
pub const RECORD_SEPARATOR: &str = "------------------------";

/// Status code QWeather reports in the body of a successful response
pub const API_OK_CODE: &str = "200";

pub const CITY_LOOKUP_PATH: &str = "/geo/v2/city/lookup";
pub const WEATHER_PATH: &str = "/v7/weather";
pub const WARNING_PATH: &str = "/v7/warning/now";
pub const INDICES_PATH: &str = "/v7/indices";

pub const DEFAULT_LANG: &str = "zh";
pub const DEFAULT_CITY_NUMBER: u8 = 10;
