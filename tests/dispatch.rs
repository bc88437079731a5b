//! End-to-end tool calls against a mock QWeather upstream.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use qweather_mcp_server::auth::Claims;
use qweather_mcp_server::{Config, Credentials, QWeather, ToolError};
use rmcp::model::JsonObject;
use serde_json::{json, Value};
use tiny_http::{Header, Response, Server};
use url::Url;

const PRIVATE_KEY: &str = include_str!("fixtures/ed25519_private.pem");
const PUBLIC_KEY: &str = include_str!("fixtures/ed25519_public.pem");

/// What the mock upstream saw
struct Captured {
    url: String,
    accept: Option<String>,
    authorization: Option<String>,
}

impl Captured {
    fn path(&self) -> String {
        self.parsed().path().to_string()
    }

    fn query(&self) -> Vec<(String, String)> {
        self.parsed().query_pairs().into_owned().collect()
    }

    fn parsed(&self) -> Url {
        Url::parse("http://upstream").unwrap().join(&self.url).unwrap()
    }
}

struct MockUpstream {
    host: String,
    requests: mpsc::Receiver<Captured>,
    handle: thread::JoinHandle<()>,
}

impl MockUpstream {
    /// Serves a single request with the given status and body.
    fn start(status: u16, body: Value) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let (tx, requests) = mpsc::channel();

        let handle = thread::spawn(move || {
            let Ok(Some(request)) = server.recv_timeout(Duration::from_secs(3)) else {
                return;
            };
            let header = |name: &'static str| {
                request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv(name))
                    .map(|h| h.value.as_str().to_string())
            };
            let captured = Captured {
                url: request.url().to_string(),
                accept: header("Accept"),
                authorization: header("Authorization"),
            };
            let _ = tx.send(captured);

            let response = Response::from_string(body.to_string())
                .with_status_code(status)
                .with_header(
                    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap(),
                );
            let _ = request.respond(response);
        });

        Self {
            host: format!("http://{addr}"),
            requests,
            handle,
        }
    }

    fn server(&self, private_key: &str) -> QWeather {
        let credentials = Credentials::new(private_key, "KEY123", "PROJ456");
        QWeather::new(Config::new(&self.host, credentials).unwrap()).unwrap()
    }

    /// Waits for the mock thread and returns the request it received, if any.
    fn finish(self) -> Option<Captured> {
        let captured = self.requests.recv_timeout(Duration::from_secs(4)).ok();
        self.handle.join().unwrap();
        captured
    }
}

fn args(value: Value) -> JsonObject {
    value.as_object().cloned().unwrap()
}

async fn call_ok(mock: &MockUpstream, name: &str, arguments: Value) -> String {
    mock.server(PRIVATE_KEY)
        .call(name, Some(&args(arguments)))
        .await
        .unwrap()
}

#[tokio::test]
async fn current_weather_renders_labelled_lines() {
    let mock = MockUpstream::start(
        200,
        json!({
            "code": "200",
            "now": {
                "obsTime": "2024-05-01T12:00+08:00",
                "temp": "20",
                "feelsLike": "18",
                "text": "晴",
                "windDir": "西北风",
                "windScale": "3"
            }
        }),
    );

    let text = call_ok(&mock, "get-weather", json!({"location": "116.40,39.90"})).await;
    let captured = mock.finish().unwrap();

    assert!(text.contains("地点: 116.40,39.90"));
    assert!(text.contains("温度: 20°C"));
    assert!(text.contains("天气: 晴"));
    assert!(text.contains("体感温度: 18°C"));
    assert!(text.contains("风力: 3级"));
    assert_eq!(text.matches("20°C").count(), 1);

    assert_eq!(captured.path(), "/v7/weather/now");
    assert_eq!(
        captured.query(),
        vec![("location".to_string(), "116.40,39.90".to_string())]
    );
}

#[tokio::test]
async fn requests_carry_json_accept_and_fresh_bearer_token() {
    let mock = MockUpstream::start(200, json!({"code": "200", "warning": []}));
    call_ok(&mock, "weather-warning", json!({"location": "101010100"})).await;
    let captured = mock.finish().unwrap();

    assert_eq!(captured.accept.as_deref(), Some("application/json"));
    let token = captured
        .authorization
        .as_deref()
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap();

    let header = decode_header(token).unwrap();
    assert_eq!(header.alg, Algorithm::EdDSA);
    assert_eq!(header.kid.as_deref(), Some("KEY123"));

    let key = DecodingKey::from_ed_pem(PUBLIC_KEY.as_bytes()).unwrap();
    let claims = decode::<Claims>(token, &key, &Validation::new(Algorithm::EdDSA))
        .unwrap()
        .claims;
    assert_eq!(claims.sub, "PROJ456");
    assert_eq!(claims.exp - claims.iat, 900);
}

#[tokio::test]
async fn hourly_spans_hit_the_hourly_endpoint() {
    let mock = MockUpstream::start(
        200,
        json!({
            "code": "200",
            "hourly": [
                {"fxTime": "T1", "temp": "18", "text": "多云", "windDir": "东风", "windScale": "1-2", "humidity": "60"},
                {"fxTime": "T2", "temp": "17", "text": "阴", "windDir": "东风", "windScale": "1-2", "humidity": "65"}
            ]
        }),
    );

    let text = call_ok(&mock, "get-weather", json!({"location": "101010100", "days": "72h"})).await;
    let captured = mock.finish().unwrap();

    assert_eq!(captured.path(), "/v7/weather/72h");
    assert!(text.starts_with("地点: 101010100\n72小时预报:\n"));
    assert!(text.contains("时间: T1\n天气: 多云\n温度: 18°C\n湿度: 60%\n风向: 东风 1-2级"));
    assert!(text.contains("湿度: 65%"));
    assert_eq!(text.matches("------------------------").count(), 2);
}

#[tokio::test]
async fn daily_spans_pass_the_value_through_as_path_segment() {
    let mock = MockUpstream::start(
        200,
        json!({
            "code": "200",
            "daily": [{
                "fxDate": "2024-05-01",
                "tempMax": "25",
                "tempMin": "12",
                "textDay": "晴",
                "textNight": "多云",
                "windDirDay": "南风",
                "windScaleDay": "3-4",
                "windDirNight": "北风",
                "windScaleNight": "1-2"
            }]
        }),
    );

    let text = call_ok(&mock, "get-weather", json!({"location": "101010100", "days": "15d"})).await;
    let captured = mock.finish().unwrap();

    assert_eq!(captured.path(), "/v7/weather/15d");
    assert!(text.contains("15天预报:"));
    assert!(text.contains("最高温度: 25°C"));
    assert!(text.contains("最低温度: 12°C"));
    assert!(text.contains("白天风向: 南风 3-4级"));
    assert!(text.contains("夜间风向: 北风 1-2级"));
}

#[tokio::test]
async fn city_lookup_sends_default_number_and_omits_unset_filters() {
    let mock = MockUpstream::start(
        200,
        json!({
            "code": "200",
            "location": [{
                "name": "朝阳",
                "id": "101010300",
                "lat": "39.92149",
                "lon": "116.48641",
                "adm2": "北京",
                "adm1": "北京市",
                "country": "中国",
                "tz": "Asia/Shanghai",
                "utcOffset": "+08:00",
                "isDst": "0",
                "type": "city",
                "rank": "15",
                "fxLink": "https://www.qweather.com/weather/chaoyang-101010300.html"
            }]
        }),
    );

    let text = call_ok(&mock, "city-lookup", json!({"location": "朝阳"})).await;
    let captured = mock.finish().unwrap();

    assert_eq!(captured.path(), "/geo/v2/city/lookup");
    assert_eq!(
        captured.query(),
        vec![
            ("location".to_string(), "朝阳".to_string()),
            ("number".to_string(), "10".to_string()),
        ]
    );
    assert!(text.starts_with("搜索 \"朝阳\" 的结果:\n"));
    assert!(text.contains("ID: 101010300"));
    assert!(text.contains("经纬度: 39.92149, 116.48641"));
    assert!(text.contains("省份: 北京市"));
    assert!(text.contains("时区: Asia/Shanghai"));
    assert!(text.ends_with("类型: city\n------------------------"));
}

#[tokio::test]
async fn warnings_render_every_field() {
    let mock = MockUpstream::start(
        200,
        json!({
            "code": "200",
            "warning": [{
                "id": "10101010020240501120000",
                "sender": "北京市气象台",
                "pubTime": "2024-05-01T12:00+08:00",
                "title": "北京市气象台发布大风蓝色预警",
                "startTime": "2024-05-01T12:00+08:00",
                "endTime": "2024-05-02T12:00+08:00",
                "status": "active",
                "level": "",
                "severity": "Minor",
                "type": "1006",
                "typeName": "大风",
                "urgency": "",
                "certainty": "",
                "text": "预计今天下午有大风。",
                "related": ""
            }]
        }),
    );

    let text = call_ok(&mock, "weather-warning", json!({"location": "101010100", "lang": "en"})).await;
    let captured = mock.finish().unwrap();

    assert_eq!(captured.path(), "/v7/warning/now");
    assert!(captured
        .query()
        .contains(&("lang".to_string(), "en".to_string())));
    assert!(text.starts_with("101010100 地区天气预警信息:\n"));
    assert!(text.contains("预警类型: 大风 (1006)"));
    assert!(text.contains("生效时间: 2024-05-01T12:00+08:00 至 2024-05-02T12:00+08:00"));
    assert!(text.contains("发布单位: 北京市气象台"));
    assert!(text.contains("预警内容: 预计今天下午有大风。"));
}

#[tokio::test]
async fn warnings_with_null_fields_still_render() {
    let mock = MockUpstream::start(
        200,
        json!({
            "code": "200",
            "warning": [{
                "sender": "北京市气象台",
                "title": "北京市气象台发布暴雨黄色预警",
                "status": "active",
                "level": null,
                "type": "1003",
                "typeName": "暴雨",
                "urgency": null,
                "certainty": null,
                "text": "预计今天夜间有暴雨。"
            }]
        }),
    );

    let text = call_ok(&mock, "weather-warning", json!({"location": "101010100"})).await;
    mock.finish().unwrap();

    assert!(text.starts_with("101010100 地区天气预警信息:\n"));
    assert!(text.contains("预警标题: 北京市气象台发布暴雨黄色预警"));
    assert!(text.contains("紧急程度: \n"));
    assert!(text.contains("预警内容: 预计今天夜间有暴雨。"));
}

#[tokio::test]
async fn indices_forecast_passes_type_and_days() {
    let mock = MockUpstream::start(
        200,
        json!({
            "code": "200",
            "daily": [{
                "date": "2024-05-01",
                "type": "1",
                "name": "运动指数",
                "level": "2",
                "category": "较适宜",
                "text": "天气较好，适宜户外运动。"
            }]
        }),
    );

    let text = call_ok(
        &mock,
        "indices-forecast",
        json!({"location": "101010100", "type": "1,3", "days": "3d"}),
    )
    .await;
    let captured = mock.finish().unwrap();

    assert_eq!(captured.path(), "/v7/indices/3d");
    assert_eq!(
        captured.query(),
        vec![
            ("location".to_string(), "101010100".to_string()),
            ("type".to_string(), "1,3".to_string()),
            ("lang".to_string(), "zh".to_string()),
        ]
    );
    assert!(text.contains("类型: 运动指数（ID: 1）"));
    assert!(text.contains("建议: 天气较好，适宜户外运动。"));
}

#[tokio::test]
async fn not_found_status_degrades_to_message_for_every_tool() {
    let cases = [
        ("get-weather", json!({"location": "x"}), "无法获取 x 的天气数据"),
        ("get-weather", json!({"location": "x", "days": "24h"}), "无法获取 x 的逐小时天气预报数据"),
        ("get-weather", json!({"location": "x", "days": "7d"}), "无法获取 x 的天气预报数据"),
        ("city-lookup", json!({"location": "x"}), "未找到城市 \"x\" 的相关信息"),
        ("weather-warning", json!({"location": "x"}), "当前 x 地区暂无天气预警信息"),
        ("indices-forecast", json!({"location": "x", "type": "1"}), "未查询到 x 的天气指数信息"),
    ];

    for (name, arguments, expected) in cases {
        let mock = MockUpstream::start(404, json!({"error": {"status": 404}}));
        let text = call_ok(&mock, name, arguments).await;
        assert!(mock.finish().is_some(), "{name} did not reach upstream");
        assert_eq!(text, expected);
    }
}

#[tokio::test]
async fn empty_results_and_error_codes_are_not_found() {
    let mock = MockUpstream::start(200, json!({"code": "200", "location": []}));
    let text = call_ok(&mock, "city-lookup", json!({"location": "火星"})).await;
    mock.finish();
    assert_eq!(text, "未找到城市 \"火星\" 的相关信息");

    let mock = MockUpstream::start(200, json!({"code": "204"}));
    let text = call_ok(&mock, "indices-forecast", json!({"location": "x", "type": "1"})).await;
    mock.finish();
    assert_eq!(text, "未查询到 x 的天气指数信息");

    let mock = MockUpstream::start(200, json!("not an object"));
    let text = call_ok(&mock, "get-weather", json!({"location": "x"})).await;
    mock.finish();
    assert_eq!(text, "无法获取 x 的天气数据");
}

#[tokio::test]
async fn signing_failure_aborts_before_any_request() {
    let mock = MockUpstream::start(200, json!({"code": "200"}));
    let result = mock
        .server("not a key")
        .call("get-weather", Some(&args(json!({"location": "x"}))))
        .await;

    assert!(matches!(result, Err(ToolError::Signing(_))));
    assert!(mock.finish().is_none());
}

#[tokio::test]
async fn invalid_arguments_never_reach_upstream() {
    let mock = MockUpstream::start(200, json!({"code": "200"}));
    let result = mock
        .server(PRIVATE_KEY)
        .call("city-lookup", Some(&args(json!({"number": 50}))))
        .await;

    let Err(ToolError::InvalidArguments(err)) = result else {
        panic!("expected validation error");
    };
    assert_eq!(err.paths(), vec!["location", "number"]);
    assert!(mock.finish().is_none());
}

#[tokio::test]
async fn unknown_tool_is_an_error() {
    let mock = MockUpstream::start(200, json!({"code": "200"}));
    let result = mock.server(PRIVATE_KEY).call("get-tides", None).await;

    assert!(matches!(result, Err(ToolError::UnknownTool(_))));
    assert!(mock.finish().is_none());
}
