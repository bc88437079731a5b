use std::fmt;

use schemars::JsonSchema;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{DEFAULT_CITY_NUMBER, DEFAULT_LANG};

// ============================================================================
// QWeather API Models
// ============================================================================

/// Fields every QWeather body carries next to its payload
#[derive(Debug, Default, Deserialize)]
pub struct ApiStatus {
    /// Body-level status, `"200"` on success
    #[serde(default)]
    pub code: Option<String>,
}

/// QWeather sends `null` for fields it has no value for; read those as empty.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
pub struct WeatherNowResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    pub now: Option<WeatherNow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WeatherNow {
    #[serde(rename = "obsTime", deserialize_with = "null_as_default")]
    pub obs_time: String,
    #[serde(deserialize_with = "null_as_default")]
    pub temp: String,
    #[serde(rename = "feelsLike", deserialize_with = "null_as_default")]
    pub feels_like: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(rename = "windDir", deserialize_with = "null_as_default")]
    pub wind_dir: String,
    #[serde(rename = "windScale", deserialize_with = "null_as_default")]
    pub wind_scale: String,
}

#[derive(Debug, Deserialize)]
pub struct WeatherHourlyResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hourly: Vec<WeatherHour>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WeatherHour {
    #[serde(rename = "fxTime", deserialize_with = "null_as_default")]
    pub fx_time: String,
    #[serde(deserialize_with = "null_as_default")]
    pub temp: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(rename = "windDir", deserialize_with = "null_as_default")]
    pub wind_dir: String,
    #[serde(rename = "windScale", deserialize_with = "null_as_default")]
    pub wind_scale: String,
    #[serde(deserialize_with = "null_as_default")]
    pub humidity: String,
}

#[derive(Debug, Deserialize)]
pub struct WeatherDailyResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub daily: Vec<WeatherDay>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WeatherDay {
    #[serde(deserialize_with = "null_as_default")]
    pub fx_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub temp_max: String,
    #[serde(deserialize_with = "null_as_default")]
    pub temp_min: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text_day: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text_night: String,
    #[serde(deserialize_with = "null_as_default")]
    pub wind_dir_day: String,
    #[serde(deserialize_with = "null_as_default")]
    pub wind_scale_day: String,
    #[serde(deserialize_with = "null_as_default")]
    pub wind_dir_night: String,
    #[serde(deserialize_with = "null_as_default")]
    pub wind_scale_night: String,
}

#[derive(Debug, Deserialize)]
pub struct CityLookupResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: Vec<City>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct City {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub lat: String,
    #[serde(deserialize_with = "null_as_default")]
    pub lon: String,
    #[serde(deserialize_with = "null_as_default")]
    pub adm2: String,
    #[serde(deserialize_with = "null_as_default")]
    pub adm1: String,
    #[serde(deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tz: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct WarningResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub warning: Vec<Warning>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Warning {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sender: String,
    #[serde(deserialize_with = "null_as_default")]
    pub pub_time: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub start_time: String,
    #[serde(deserialize_with = "null_as_default")]
    pub end_time: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub level: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub type_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub urgency: String,
    #[serde(deserialize_with = "null_as_default")]
    pub certainty: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct IndicesResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub daily: Vec<LifeIndex>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LifeIndex {
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub level: String,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
}

// ============================================================================
// MCP Tool Request Models
// ============================================================================

/// Forecast span accepted by `get-weather`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum WeatherDays {
    #[default]
    #[serde(rename = "now")]
    Now,
    #[serde(rename = "24h")]
    Hours24,
    #[serde(rename = "72h")]
    Hours72,
    #[serde(rename = "168h")]
    Hours168,
    #[serde(rename = "3d")]
    Days3,
    #[serde(rename = "7d")]
    Days7,
    #[serde(rename = "10d")]
    Days10,
    #[serde(rename = "15d")]
    Days15,
    #[serde(rename = "30d")]
    Days30,
}

/// Which upstream endpoint family a `WeatherDays` value maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastKind {
    Now,
    Hourly(u16),
    Daily(u16),
}

impl WeatherDays {
    pub const ALL: [WeatherDays; 9] = [
        WeatherDays::Now,
        WeatherDays::Hours24,
        WeatherDays::Hours72,
        WeatherDays::Hours168,
        WeatherDays::Days3,
        WeatherDays::Days7,
        WeatherDays::Days10,
        WeatherDays::Days15,
        WeatherDays::Days30,
    ];

    /// Wire value, also used as the URL path segment
    pub fn as_str(self) -> &'static str {
        match self {
            WeatherDays::Now => "now",
            WeatherDays::Hours24 => "24h",
            WeatherDays::Hours72 => "72h",
            WeatherDays::Hours168 => "168h",
            WeatherDays::Days3 => "3d",
            WeatherDays::Days7 => "7d",
            WeatherDays::Days10 => "10d",
            WeatherDays::Days15 => "15d",
            WeatherDays::Days30 => "30d",
        }
    }

    pub fn kind(self) -> ForecastKind {
        match self {
            WeatherDays::Now => ForecastKind::Now,
            WeatherDays::Hours24 => ForecastKind::Hourly(24),
            WeatherDays::Hours72 => ForecastKind::Hourly(72),
            WeatherDays::Hours168 => ForecastKind::Hourly(168),
            WeatherDays::Days3 => ForecastKind::Daily(3),
            WeatherDays::Days7 => ForecastKind::Daily(7),
            WeatherDays::Days10 => ForecastKind::Daily(10),
            WeatherDays::Days15 => ForecastKind::Daily(15),
            WeatherDays::Days30 => ForecastKind::Daily(30),
        }
    }
}

impl fmt::Display for WeatherDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forecast span accepted by `indices-forecast`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum IndicesDays {
    #[default]
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "3d")]
    Days3,
}

impl IndicesDays {
    pub const ALL: [IndicesDays; 2] = [IndicesDays::Day1, IndicesDays::Days3];

    pub fn as_str(self) -> &'static str {
        match self {
            IndicesDays::Day1 => "1d",
            IndicesDays::Days3 => "3d",
        }
    }
}

impl fmt::Display for IndicesDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_lang() -> String {
    DEFAULT_LANG.to_string()
}

fn default_city_number() -> u8 {
    DEFAULT_CITY_NUMBER
}

/// Accepts `10.0` as well as `10`; the argument schema has already bounded it.
fn whole_number<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || !(0.0..=f64::from(u8::MAX)).contains(&value) {
        return Err(D::Error::custom(format!("expected a whole number, got {value}")));
    }
    Ok(value as u8)
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct GetWeatherRequest {
    #[schemars(description = "逗号分隔的经纬度信息 (e.g., 116.40,39.90)")]
    pub location: String,
    #[serde(default)]
    #[schemars(
        description = "预报天数，now为实时天气，24h为24小时预报，72h为72小时预报，168h为168小时预报，3d为3天预报，以此类推"
    )]
    pub days: WeatherDays,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct CityLookupRequest {
    #[schemars(description = "城市名称，支持模糊搜索")]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "上级行政区划，可选参数")]
    pub adm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "搜索范围，可选参数")]
    pub range: Option<String>,
    #[serde(default = "default_city_number", deserialize_with = "whole_number")]
    #[schemars(description = "返回结果数量，1-20，默认10", range(min = 1, max = 20))]
    pub number: u8,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct WeatherWarningRequest {
    #[schemars(description = "LocationID或经纬度坐标 (e.g., 101010100 或 116.41,39.92)")]
    pub location: String,
    #[serde(default = "default_lang")]
    #[schemars(description = "多语言设置，默认zh")]
    pub lang: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct IndicesForecastRequest {
    #[schemars(description = "LocationID或经纬度坐标 (e.g., 101010100 或 116.41,39.92)")]
    pub location: String,
    #[serde(rename = "type")]
    #[schemars(description = "指数类型ID，多个用英文逗号分隔（如1,2,3）")]
    pub index_type: String,
    #[serde(default)]
    #[schemars(description = "预报天数，1d或3d")]
    pub days: IndicesDays,
    #[serde(default = "default_lang")]
    #[schemars(description = "多语言设置，默认zh")]
    pub lang: String,
}
