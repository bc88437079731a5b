//! The fixed set of tools this server exposes and their argument parsing.

use rmcp::model::{JsonObject, Tool};
use rmcp::ErrorData as McpError;
use serde_json::json;
use thiserror::Error;

use crate::auth::SigningError;
use crate::models::{
    CityLookupRequest, GetWeatherRequest, IndicesForecastRequest, WeatherWarningRequest,
};
use crate::validation::{ArgumentSchema, SchemaError, ValidationError};

pub const GET_WEATHER: &str = "get-weather";
pub const CITY_LOOKUP: &str = "city-lookup";
pub const WEATHER_WARNING: &str = "weather-warning";
pub const INDICES_FORECAST: &str = "indices-forecast";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error(transparent)]
    InvalidArguments(#[from] ValidationError),
    #[error("Failed to authenticate with QWeather: {0}")]
    Signing(#[from] SigningError),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        match &err {
            ToolError::UnknownTool(_) => McpError::invalid_params(err.to_string(), None),
            ToolError::InvalidArguments(validation) => McpError::invalid_params(
                err.to_string(),
                Some(json!({ "violations": validation.violations })),
            ),
            ToolError::Signing(_) => McpError::internal_error(err.to_string(), None),
        }
    }
}

/// A validated tool invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    GetWeather(GetWeatherRequest),
    CityLookup(CityLookupRequest),
    WeatherWarning(WeatherWarningRequest),
    IndicesForecast(IndicesForecastRequest),
}

impl ToolCall {
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::GetWeather(_) => GET_WEATHER,
            ToolCall::CityLookup(_) => CITY_LOOKUP,
            ToolCall::WeatherWarning(_) => WEATHER_WARNING,
            ToolCall::IndicesForecast(_) => INDICES_FORECAST,
        }
    }

    pub fn location(&self) -> &str {
        match self {
            ToolCall::GetWeather(r) => &r.location,
            ToolCall::CityLookup(r) => &r.location,
            ToolCall::WeatherWarning(r) => &r.location,
            ToolCall::IndicesForecast(r) => &r.location,
        }
    }
}

/// The tools this server exposes, each with its compiled argument schema
#[derive(Debug)]
pub struct ToolCatalog {
    get_weather: ArgumentSchema<GetWeatherRequest>,
    city_lookup: ArgumentSchema<CityLookupRequest>,
    weather_warning: ArgumentSchema<WeatherWarningRequest>,
    indices_forecast: ArgumentSchema<IndicesForecastRequest>,
}

impl ToolCatalog {
    pub fn new() -> Result<Self, SchemaError> {
        Ok(Self {
            get_weather: ArgumentSchema::compile()?,
            city_lookup: ArgumentSchema::compile()?,
            weather_warning: ArgumentSchema::compile()?,
            indices_forecast: ArgumentSchema::compile()?,
        })
    }

    /// Resolves a tool name and validates its arguments.
    ///
    /// Missing arguments are treated as an empty object so that required
    /// fields are reported individually.
    pub fn parse(
        &self,
        name: &str,
        arguments: Option<&JsonObject>,
    ) -> Result<ToolCall, ToolError> {
        let empty = JsonObject::new();
        let args = arguments.unwrap_or(&empty);

        let call = match name {
            GET_WEATHER => ToolCall::GetWeather(self.get_weather.parse(args)?),
            CITY_LOOKUP => ToolCall::CityLookup(self.city_lookup.parse(args)?),
            WEATHER_WARNING => ToolCall::WeatherWarning(self.weather_warning.parse(args)?),
            INDICES_FORECAST => ToolCall::IndicesForecast(self.indices_forecast.parse(args)?),
            other => return Err(ToolError::UnknownTool(other.to_string())),
        };
        Ok(call)
    }

    /// Tool definitions advertised through `tools/list`
    pub fn definitions(&self) -> Vec<Tool> {
        vec![
            Tool::new(
                GET_WEATHER,
                "获取中国国内的天气预报",
                self.get_weather.schema(),
            ),
            Tool::new(
                CITY_LOOKUP,
                "根据城市名称搜索城市信息，返回经纬度坐标",
                self.city_lookup.schema(),
            ),
            Tool::new(
                WEATHER_WARNING,
                "获取天气灾害预警信息",
                self.weather_warning.schema(),
            ),
            Tool::new(
                INDICES_FORECAST,
                "获取天气生活指数预报（如穿衣、洗车、运动等）",
                self.indices_forecast.schema(),
            ),
        ]
    }
}
