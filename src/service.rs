use std::sync::Arc;

use anyhow::Result;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use rmcp::{
    handler::server::ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject,
        ListToolsResult, PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    ErrorData as McpError, RoleServer,
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::auth::SigningError;
use crate::config::Config;
use crate::constants::{
    API_OK_CODE, CITY_LOOKUP_PATH, INDICES_PATH, USER_AGENT, WARNING_PATH, WEATHER_PATH,
};
use crate::formatters::{
    city_not_found, daily_not_found, format_cities, format_daily_forecast,
    format_hourly_forecast, format_indices, format_warnings, format_weather_now,
    hourly_not_found, indices_not_found, warnings_not_found, weather_now_not_found,
};
use crate::models::{
    ApiStatus, CityLookupRequest, CityLookupResponse, ForecastKind, GetWeatherRequest,
    IndicesForecastRequest, IndicesResponse, WarningResponse, WeatherDailyResponse,
    WeatherHourlyResponse, WeatherNowResponse, WeatherWarningRequest,
};
use crate::tools::{
    ToolCall, ToolCatalog, ToolError, CITY_LOOKUP, GET_WEATHER, INDICES_FORECAST,
    WEATHER_WARNING,
};

/// Why a QWeather request produced no usable body
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("request failed with status: {0}")]
    Status(StatusCode),
    #[error("failed to decode response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("QWeather returned code {0}")]
    Api(String),
}

/// Gives the fetch layer access to the body-level status code.
pub trait ApiBody {
    fn status(&self) -> &ApiStatus;
}

macro_rules! impl_api_body {
    ($($ty:ty),* $(,)?) => {
        $(impl ApiBody for $ty {
            fn status(&self) -> &ApiStatus {
                &self.status
            }
        })*
    };
}

impl_api_body!(
    WeatherNowResponse,
    WeatherHourlyResponse,
    WeatherDailyResponse,
    CityLookupResponse,
    WarningResponse,
    IndicesResponse,
);

/// Builds the QWeather URL a validated call will be sent to.
///
/// Optional arguments without a default are left out of the query string.
pub fn upstream_url(config: &Config, call: &ToolCall) -> Url {
    match call {
        ToolCall::GetWeather(request) => weather_url(config, request),
        ToolCall::CityLookup(request) => city_lookup_url(config, request),
        ToolCall::WeatherWarning(request) => warning_url(config, request),
        ToolCall::IndicesForecast(request) => indices_url(config, request),
    }
}

fn weather_url(config: &Config, request: &GetWeatherRequest) -> Url {
    let mut url = config.endpoint(&format!("{}/{}", WEATHER_PATH, request.days));
    url.query_pairs_mut().append_pair("location", &request.location);
    url
}

fn city_lookup_url(config: &Config, request: &CityLookupRequest) -> Url {
    let mut url = config.endpoint(CITY_LOOKUP_PATH);
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("location", &request.location);
        if let Some(adm) = &request.adm {
            query.append_pair("adm", adm);
        }
        if let Some(range) = &request.range {
            query.append_pair("range", range);
        }
        query.append_pair("number", &request.number.to_string());
    }
    url
}

fn warning_url(config: &Config, request: &WeatherWarningRequest) -> Url {
    let mut url = config.endpoint(WARNING_PATH);
    url.query_pairs_mut()
        .append_pair("location", &request.location)
        .append_pair("lang", &request.lang);
    url
}

fn indices_url(config: &Config, request: &IndicesForecastRequest) -> Url {
    let mut url = config.endpoint(&format!("{}/{}", INDICES_PATH, request.days));
    url.query_pairs_mut()
        .append_pair("location", &request.location)
        .append_pair("type", &request.index_type)
        .append_pair("lang", &request.lang);
    url
}

/// Upstream failures become "no data"; the handler then answers with its
/// not-found message.
fn degrade<T>(tool: &str, result: Result<T, UpstreamError>) -> Option<T> {
    match result {
        Ok(body) => Some(body),
        Err(err) => {
            tracing::warn!(tool, error = %err, "QWeather request failed");
            None
        }
    }
}

/// MCP server exposing QWeather lookups
#[derive(Clone)]
pub struct QWeather {
    client: Arc<Client>,
    config: Arc<Config>,
    tools: Arc<ToolCatalog>,
}

impl QWeather {
    /// Creates a new QWeather service instance
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        let tools = ToolCatalog::new()?;

        Ok(Self {
            client: Arc::new(client),
            config: Arc::new(config),
            tools: Arc::new(tools),
        })
    }

    /// Validates and runs one tool call, returning the text to show the caller.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<&JsonObject>,
    ) -> Result<String, ToolError> {
        let call = self.tools.parse(name, arguments).inspect_err(|err| {
            tracing::warn!(tool = name, error = %err, "Rejected tool call");
        })?;
        self.dispatch(call).await
    }

    /// Runs a validated call: one fresh token, at most one GET.
    pub async fn dispatch(&self, call: ToolCall) -> Result<String, ToolError> {
        tracing::info!(tool = call.name(), location = call.location(), "Handling tool call");

        let url = upstream_url(&self.config, &call);
        let token = self.config.credentials.mint().inspect_err(|err: &SigningError| {
            tracing::error!(tool = call.name(), error = %err, "Failed to mint QWeather token");
        })?;

        let text = match &call {
            ToolCall::GetWeather(request) => self.get_weather(request, url, &token).await,
            ToolCall::CityLookup(request) => self.city_lookup(request, url, &token).await,
            ToolCall::WeatherWarning(request) => {
                self.weather_warning(request, url, &token).await
            }
            ToolCall::IndicesForecast(request) => {
                self.indices_forecast(request, url, &token).await
            }
        };
        Ok(text)
    }

    /// Makes an authenticated HTTP GET request and deserializes the JSON response
    async fn fetch<T>(&self, url: Url, token: &str) -> Result<T, UpstreamError>
    where
        T: DeserializeOwned + ApiBody,
    {
        tracing::debug!(%url, "Requesting QWeather");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .bearer_auth(token)
            .send()
            .await
            .map_err(UpstreamError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let body = response.json::<T>().await.map_err(UpstreamError::Decode)?;
        if let Some(code) = body.status().code.as_deref().filter(|code| *code != API_OK_CODE) {
            return Err(UpstreamError::Api(code.to_string()));
        }
        Ok(body)
    }

    async fn get_weather(&self, request: &GetWeatherRequest, url: Url, token: &str) -> String {
        let location = &request.location;

        match request.days.kind() {
            ForecastKind::Now => {
                let body = degrade(GET_WEATHER, self.fetch::<WeatherNowResponse>(url, token).await);
                match body.and_then(|body| body.now) {
                    Some(now) => format_weather_now(location, &now),
                    None => weather_now_not_found(location),
                }
            }
            ForecastKind::Hourly(hours) => {
                let body = self.fetch::<WeatherHourlyResponse>(url, token).await;
                let body = degrade(GET_WEATHER, body);
                match body.map(|body| body.hourly) {
                    Some(hourly) if !hourly.is_empty() => {
                        format_hourly_forecast(location, hours, &hourly)
                    }
                    _ => hourly_not_found(location),
                }
            }
            ForecastKind::Daily(days) => {
                let body = self.fetch::<WeatherDailyResponse>(url, token).await;
                let body = degrade(GET_WEATHER, body);
                match body.map(|body| body.daily) {
                    Some(daily) if !daily.is_empty() => {
                        format_daily_forecast(location, days, &daily)
                    }
                    _ => daily_not_found(location),
                }
            }
        }
    }

    async fn city_lookup(&self, request: &CityLookupRequest, url: Url, token: &str) -> String {
        let body = degrade(CITY_LOOKUP, self.fetch::<CityLookupResponse>(url, token).await);
        match body.map(|body| body.location) {
            Some(cities) if !cities.is_empty() => format_cities(&request.location, &cities),
            _ => city_not_found(&request.location),
        }
    }

    async fn weather_warning(
        &self,
        request: &WeatherWarningRequest,
        url: Url,
        token: &str,
    ) -> String {
        let body = degrade(WEATHER_WARNING, self.fetch::<WarningResponse>(url, token).await);
        match body.map(|body| body.warning) {
            Some(warnings) if !warnings.is_empty() => {
                format_warnings(&request.location, &warnings)
            }
            _ => warnings_not_found(&request.location),
        }
    }

    async fn indices_forecast(
        &self,
        request: &IndicesForecastRequest,
        url: Url,
        token: &str,
    ) -> String {
        let body = degrade(INDICES_FORECAST, self.fetch::<IndicesResponse>(url, token).await);
        match body.map(|body| body.daily) {
            Some(indices) if !indices.is_empty() => format_indices(&request.location, &indices),
            _ => indices_not_found(&request.location),
        }
    }
}

impl ServerHandler for QWeather {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "qweather-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                title: None,
                website_url: None,
            },
            instructions: Some(
                "A weather information service powered by the QWeather API. \
                Use city-lookup to resolve a city name to a LocationID or coordinates, then \
                get-weather, weather-warning or indices-forecast for that location."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tools.definitions()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let text = self.call(&request.name, request.arguments.as_ref()).await?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}
