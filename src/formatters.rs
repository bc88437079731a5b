use crate::constants::RECORD_SEPARATOR;
use crate::models::{City, LifeIndex, Warning, WeatherDay, WeatherHour, WeatherNow};

/// Renders each record and joins them, every block ending in the separator line.
fn join_records<T>(records: &[T], render: impl Fn(&T) -> String) -> String {
    records
        .iter()
        .map(|record| format!("{}\n{}", render(record), RECORD_SEPARATOR))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats current conditions into a human-readable string
pub fn format_weather_now(location: &str, now: &WeatherNow) -> String {
    format!(
        "地点: {}\n观测时间: {}\n天气: {}\n温度: {}\u{00b0}C\n体感温度: {}\u{00b0}C\n风向: {}\n风力: {}级",
        location, now.obs_time, now.text, now.temp, now.feels_like, now.wind_dir, now.wind_scale
    )
}

pub fn format_hourly_forecast(location: &str, hours: u16, hourly: &[WeatherHour]) -> String {
    let body = join_records(hourly, |hour| {
        format!(
            "时间: {}\n天气: {}\n温度: {}\u{00b0}C\n湿度: {}%\n风向: {} {}级",
            hour.fx_time, hour.text, hour.temp, hour.humidity, hour.wind_dir, hour.wind_scale
        )
    });
    format!("地点: {}\n{}小时预报:\n{}", location, hours, body)
}

pub fn format_daily_forecast(location: &str, days: u16, daily: &[WeatherDay]) -> String {
    let body = join_records(daily, |day| {
        format!(
            "日期: {}\n白天天气: {}\n夜间天气: {}\n最高温度: {}\u{00b0}C\n最低温度: {}\u{00b0}C\n白天风向: {} {}级\n夜间风向: {} {}级",
            day.fx_date,
            day.text_day,
            day.text_night,
            day.temp_max,
            day.temp_min,
            day.wind_dir_day,
            day.wind_scale_day,
            day.wind_dir_night,
            day.wind_scale_night
        )
    });
    format!("地点: {}\n{}天预报:\n{}", location, days, body)
}

/// Formats city search matches
pub fn format_cities(query: &str, cities: &[City]) -> String {
    let body = join_records(cities, |city| {
        format!(
            "城市: {}\nID: {}\n经纬度: {}, {}\n省份: {}\n城市: {}\n国家: {}\n时区: {}\n类型: {}",
            city.name,
            city.id,
            city.lat,
            city.lon,
            city.adm1,
            city.adm2,
            city.country,
            city.tz,
            city.kind
        )
    });
    format!("搜索 \"{}\" 的结果:\n{}", query, body)
}

/// Formats active weather warnings
pub fn format_warnings(location: &str, warnings: &[Warning]) -> String {
    let body = join_records(warnings, |warning| {
        format!(
            "预警标题: {}\n预警类型: {} ({})\n预警等级: {}\n预警状态: {}\n发布时间: {}\n生效时间: {} 至 {}\n紧急程度: {}\n确定性: {}\n发布单位: {}\n预警内容: {}",
            warning.title,
            warning.type_name,
            warning.kind,
            warning.level,
            warning.status,
            warning.pub_time,
            warning.start_time,
            warning.end_time,
            warning.urgency,
            warning.certainty,
            warning.sender,
            warning.text
        )
    });
    format!("{} 地区天气预警信息:\n{}", location, body)
}

pub fn format_indices(location: &str, indices: &[LifeIndex]) -> String {
    let body = join_records(indices, |index| {
        format!(
            "日期: {}\n类型: {}（ID: {}）\n等级: {}（{}）\n建议: {}",
            index.date, index.name, index.kind, index.level, index.category, index.text
        )
    });
    format!("{} 的天气生活指数:\n{}", location, body)
}

// Messages returned when QWeather has nothing for a query

pub fn weather_now_not_found(location: &str) -> String {
    format!("无法获取 {} 的天气数据", location)
}

pub fn hourly_not_found(location: &str) -> String {
    format!("无法获取 {} 的逐小时天气预报数据", location)
}

pub fn daily_not_found(location: &str) -> String {
    format!("无法获取 {} 的天气预报数据", location)
}

pub fn city_not_found(query: &str) -> String {
    format!("未找到城市 \"{}\" 的相关信息", query)
}

pub fn warnings_not_found(location: &str) -> String {
    format!("当前 {} 地区暂无天气预警信息", location)
}

pub fn indices_not_found(location: &str) -> String {
    format!("未查询到 {} 的天气指数信息", location)
}
