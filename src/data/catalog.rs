//! Paginated catalog client (Giant Bomb style listing API).
//!
//! The API returns at most [`PAGE_SIZE`] results per call and reports the total
//! result count on every page. [`CatalogClient::list_records`] hides the paging
//! behind a plain iterator:
//!
//! - offsets start at 0 and advance by each page's reported result count
//! - the total is read once, from the first page, and trusted afterwards
//! - records are handed out as soon as they are read off the current page
//! - the first error ends the stream; records already yielded stay valid

use std::cell::Cell;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::CatalogConfig;
use crate::domain::{CatalogRecord, FilterSpec, SortSpec};
use crate::error::AppError;

/// Hard page limit of the remote API.
pub const PAGE_SIZE: usize = 100;

/// One page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub sort: Option<SortSpec>,
    pub filter: FilterSpec,
    pub field_list: Vec<String>,
    pub offset: usize,
}

/// One decoded page.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage {
    pub total_results: usize,
    pub page_results: usize,
    pub results: Vec<Map<String, Value>>,
}

/// The transport seam: turn a page request into a decoded page.
pub trait PageFetcher {
    fn fetch_page(&self, request: &PageRequest) -> Result<CatalogPage, AppError>;
}

/// Decode a page body.
///
/// The counters may arrive as JSON numbers or numeric strings.
pub fn parse_page(body: Value) -> Result<CatalogPage, AppError> {
    let Value::Object(mut body) = body else {
        return Err(AppError::MalformedInput("Catalog page is not a JSON object.".to_string()));
    };

    let total_results = read_count(&body, "number_of_total_results")?;
    let page_results = read_count(&body, "number_of_page_results")?;

    let results = match body.remove("results") {
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::Object(map) => Ok(map),
                other => Err(AppError::MalformedInput(format!(
                    "Catalog result #{idx} is not an object: {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        // Some list endpoints send `[]` as `{}` when empty.
        Some(Value::Object(map)) if map.is_empty() => Vec::new(),
        Some(other) => {
            return Err(AppError::MalformedInput(format!(
                "Catalog page `results` is not an array: {other}"
            )));
        }
        None => return Err(AppError::MalformedInput("Catalog page has no `results`.".to_string())),
    };

    Ok(CatalogPage {
        total_results,
        page_results,
        results,
    })
}

fn read_count(body: &Map<String, Value>, key: &str) -> Result<usize, AppError> {
    let value = body
        .get(key)
        .ok_or_else(|| AppError::MalformedInput(format!("Catalog page is missing `{key}`.")))?;
    let count = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    count
        .and_then(|c| usize::try_from(c).ok())
        .ok_or_else(|| AppError::MalformedInput(format!("Catalog page has an invalid `{key}`: {value}")))
}

/// Coerce every `*price` field from text to a number.
///
/// Null and blank prices stay absent (`null`); they are not zero.
pub fn coerce_prices(fields: &mut Map<String, Value>) -> Result<(), AppError> {
    for (key, value) in fields.iter_mut() {
        if !key.ends_with("price") {
            continue;
        }
        let replacement = match value {
            Value::String(raw) if raw.trim().is_empty() => Value::Null,
            Value::String(raw) => {
                let parsed = raw.trim().parse::<f64>().ok().filter(|v| v.is_finite());
                let Some(price) = parsed else {
                    return Err(AppError::MalformedInput(format!("Invalid price in `{key}`: '{raw}'")));
                };
                Value::from(price)
            }
            Value::Null | Value::Number(_) => continue,
            other => {
                return Err(AppError::MalformedInput(format!("Invalid price in `{key}`: {other}")));
            }
        };
        *value = replacement;
    }
    Ok(())
}

/// Lazily walks every page of one listing.
pub struct CatalogClient<F> {
    fetcher: F,
}

impl<F: PageFetcher> CatalogClient<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Start a fresh traversal. Nothing is fetched until the first `next()`.
    pub fn list_records(
        &self,
        sort: Option<SortSpec>,
        filter: FilterSpec,
        field_list: Vec<String>,
    ) -> RecordStream<'_, F> {
        RecordStream {
            fetcher: &self.fetcher,
            request: PageRequest {
                sort,
                filter,
                field_list,
                offset: 0,
            },
            total: None,
            yielded: 0,
            page: Vec::new().into_iter(),
            done: false,
        }
    }
}

/// Cursor over one traversal. Not restartable.
pub struct RecordStream<'a, F> {
    fetcher: &'a F,
    /// `offset` doubles as the cumulative fetched count.
    request: PageRequest,
    total: Option<usize>,
    yielded: usize,
    page: std::vec::IntoIter<Map<String, Value>>,
    done: bool,
}

impl<F> RecordStream<'_, F> {
    /// Total reported by the first page, once it has been fetched.
    pub fn total(&self) -> Option<usize> {
        self.total
    }

    /// Results fetched so far (the next page's offset).
    pub fn fetched(&self) -> usize {
        self.request.offset
    }

    fn fail(&mut self, err: AppError) -> Option<Result<CatalogRecord, AppError>> {
        self.done = true;
        self.page = Vec::new().into_iter();
        Some(Err(err))
    }
}

impl<F: PageFetcher> Iterator for RecordStream<'_, F> {
    type Item = Result<CatalogRecord, AppError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(mut fields) = self.page.next() {
                if let Err(e) = coerce_prices(&mut fields) {
                    return self.fail(e);
                }
                self.yielded += 1;
                debug!(
                    "Yielding record {} of {}",
                    self.yielded,
                    self.total.unwrap_or_default()
                );
                return Some(Ok(CatalogRecord::from_fields(fields)));
            }

            if self.done {
                return None;
            }
            if let Some(total) = self.total {
                if self.request.offset >= total {
                    self.done = true;
                    return None;
                }
            }

            debug!("Fetching catalog page at offset {}", self.request.offset);
            let page = match self.fetcher.fetch_page(&self.request) {
                Ok(page) => page,
                Err(e) => return self.fail(e),
            };

            let total = *self.total.get_or_insert(page.total_results);
            if page.page_results == 0 && self.request.offset < total {
                return self.fail(AppError::MalformedInput(format!(
                    "Catalog returned an empty page at offset {} of {total}.",
                    self.request.offset
                )));
            }
            self.request.offset += page.page_results;
            self.page = page.results.into_iter();
        }
    }
}

/// `reqwest::blocking` transport for the catalog API.
pub struct HttpPageFetcher {
    client: Client,
    url: String,
    api_key: String,
    request_interval: Duration,
    last_request: Cell<Option<Instant>>,
}

impl HttpPageFetcher {
    pub fn new(config: &CatalogConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: format!(
                "{}/{}/",
                config.base_url.trim_end_matches('/'),
                config.resource.trim_matches('/')
            ),
            api_key: config.api_key.clone(),
            request_interval: config.request_interval,
            last_request: Cell::new(None),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Query parameters for one request (API key included).
    pub fn query_params(&self, request: &PageRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("api_key", self.api_key.clone()),
            ("format", "json".to_string()),
            ("offset", request.offset.to_string()),
            ("limit", PAGE_SIZE.to_string()),
        ];
        if let Some(sort) = &request.sort {
            params.push(("sort", sort.to_string()));
        }
        if !request.filter.is_empty() {
            params.push(("filter", request.filter.to_string()));
        }
        if !request.field_list.is_empty() {
            params.push(("field_list", request.field_list.join(",")));
        }
        params
    }

    fn throttle(&self) {
        if let Some(last) = self.last_request.get() {
            let elapsed = last.elapsed();
            if elapsed < self.request_interval {
                std::thread::sleep(self.request_interval - elapsed);
            }
        }
        self.last_request.set(Some(Instant::now()));
    }
}

impl PageFetcher for HttpPageFetcher {
    fn fetch_page(&self, request: &PageRequest) -> Result<CatalogPage, AppError> {
        self.throttle();

        let resp = self
            .client
            .get(&self.url)
            .query(&self.query_params(request))
            .send()
            .map_err(|e| AppError::Transport(format!("Catalog request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::Transport(format!(
                "Catalog request failed with status {}.",
                resp.status()
            )));
        }

        let body: Value = resp
            .json()
            .map_err(|e| AppError::MalformedInput(format!("Failed to parse catalog response: {e}")))?;

        // The API reports its own failures (bad key, rate limit) in-band.
        if let Some(code) = body.get("status_code").and_then(Value::as_i64) {
            if code != 1 {
                let message = body.get("error").and_then(Value::as_str).unwrap_or("unknown error");
                return Err(AppError::Transport(format!("Catalog API error {code}: {message}")));
            }
        }

        parse_page(body)
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::testing::{ScriptedFetcher, page};
    use super::*;
    use crate::data::fred::testing::{http_response, serve_once};
    use crate::domain::SortDirection;

    fn platform(name: &str, price: Value) -> Value {
        json!({ "name": name, "original_price": price, "release_date": "1990-01-01 00:00:00" })
    }

    fn list(client: &CatalogClient<ScriptedFetcher>) -> RecordStream<'_, ScriptedFetcher> {
        client.list_records(None, FilterSpec::default(), Vec::new())
    }

    #[test]
    fn walks_two_pages_in_order() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(page(3, vec![platform("A", json!("10.00")), platform("B", json!("20.00"))])),
            Ok(page(3, vec![platform("C", json!("30.00"))])),
        ]);
        let client = CatalogClient::new(fetcher);

        let names: Vec<String> = list(&client)
            .map(|r| r.unwrap().name().unwrap().to_string())
            .collect();

        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(client.fetcher().calls(), vec![0, 2]);
    }

    #[test]
    fn short_page_below_total_fetches_again() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(page(4, vec![platform("A", Value::Null)])),
            Ok(page(4, vec![platform("B", Value::Null), platform("C", Value::Null)])),
            Ok(page(4, vec![platform("D", Value::Null)])),
        ]);
        let client = CatalogClient::new(fetcher);

        assert_eq!(list(&client).count(), 4);
        assert_eq!(client.fetcher().calls(), vec![0, 1, 3]);
    }

    #[test]
    fn nothing_is_fetched_until_pulled() {
        let client = CatalogClient::new(ScriptedFetcher::new(vec![Ok(page(1, vec![platform("A", Value::Null)]))]));
        let mut stream = list(&client);
        assert!(client.fetcher().calls().is_empty());
        assert!(stream.next().is_some());
        assert_eq!(stream.total(), Some(1));
        assert_eq!(stream.fetched(), 1);
    }

    #[test]
    fn empty_listing_fetches_once() {
        let client = CatalogClient::new(ScriptedFetcher::new(vec![Ok(page(0, Vec::new()))]));
        assert_eq!(list(&client).count(), 0);
        assert_eq!(client.fetcher().calls(), vec![0]);
    }

    #[test]
    fn prices_are_coerced_and_absent_prices_stay_absent() {
        let fetcher = ScriptedFetcher::new(vec![Ok(page(
            3,
            vec![
                platform("A", json!("199.99")),
                platform("B", Value::Null),
                platform("C", json!("")),
            ],
        ))]);
        let client = CatalogClient::new(fetcher);
        let records: Vec<CatalogRecord> = list(&client).map(Result::unwrap).collect();

        assert_eq!(records[0].original_price(), Some(199.99));
        assert_eq!(records[0].get("original_price"), Some(&json!(199.99)));
        assert_eq!(records[1].original_price(), None);
        assert_eq!(records[2].get("original_price"), Some(&Value::Null));
    }

    #[test]
    fn bad_price_ends_stream_after_prior_records() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(page(4, vec![platform("A", json!("10")), platform("B", json!("20"))])),
            Ok(page(4, vec![platform("C", json!("a lot")), platform("D", json!("40"))])),
        ]);
        let client = CatalogClient::new(fetcher);
        let mut stream = list(&client);

        let mut kept = Vec::new();
        let mut error = None;
        for item in stream.by_ref() {
            match item {
                Ok(r) => kept.push(r),
                Err(e) => {
                    error = Some(e);
                    break;
                }
            }
        }

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].name(), Some("B"));
        assert!(matches!(error, Some(AppError::MalformedInput(_))));
        assert!(stream.next().is_none(), "stream must stay finished after an error");
    }

    #[test]
    fn transport_error_surfaces_and_ends_stream() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(page(3, vec![platform("A", Value::Null), platform("B", Value::Null)])),
            Err(AppError::Transport("status 502".to_string())),
        ]);
        let client = CatalogClient::new(fetcher);
        let items: Vec<_> = list(&client).collect();

        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok() && items[1].is_ok());
        assert!(matches!(items[2], Err(AppError::Transport(_))));
        assert_eq!(client.fetcher().calls(), vec![0, 2]);
    }

    #[test]
    fn page_without_counters_is_malformed() {
        let fetcher = ScriptedFetcher::new(vec![Ok(json!({ "results": [] }))]);
        let client = CatalogClient::new(fetcher);
        let items: Vec<_> = list(&client).collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(AppError::MalformedInput(_))));
    }

    #[test]
    fn empty_page_short_of_total_is_malformed() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(page(5, vec![platform("A", Value::Null)])),
            Ok(page(5, Vec::new())),
        ]);
        let client = CatalogClient::new(fetcher);
        let items: Vec<_> = list(&client).collect();
        assert_eq!(items.len(), 2);
        assert!(matches!(items[1], Err(AppError::MalformedInput(_))));
    }

    #[test]
    fn total_is_read_from_first_page_only() {
        // A later page reporting a larger total does not extend the traversal.
        let fetcher = ScriptedFetcher::new(vec![
            Ok(page(2, vec![platform("A", Value::Null)])),
            Ok(page(50, vec![platform("B", Value::Null)])),
        ]);
        let client = CatalogClient::new(fetcher);
        assert_eq!(list(&client).count(), 2);
        assert_eq!(client.fetcher().calls(), vec![0, 1]);
    }

    #[test]
    fn traversals_are_independent() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(page(1, vec![platform("A", Value::Null)])),
            Ok(page(1, vec![platform("A", Value::Null)])),
        ]);
        let client = CatalogClient::new(fetcher);
        assert_eq!(list(&client).count(), 1);
        assert_eq!(list(&client).count(), 1);
        assert_eq!(client.fetcher().calls(), vec![0, 0]);
    }

    #[test]
    fn parse_page_accepts_string_counters() {
        let parsed = parse_page(json!({
            "number_of_total_results": "7",
            "number_of_page_results": 0,
            "results": {},
        }))
        .unwrap();
        assert_eq!(parsed.total_results, 7);
        assert!(parsed.results.is_empty());
    }

    #[test]
    fn parse_page_rejects_non_object_results() {
        let res = parse_page(json!({
            "number_of_total_results": 1,
            "number_of_page_results": 1,
            "results": [42],
        }));
        assert!(matches!(res, Err(AppError::MalformedInput(_))));
    }

    #[test]
    fn http_query_params_follow_api_conventions() {
        let fetcher = HttpPageFetcher::new(&CatalogConfig::new("k3y")).unwrap();
        assert_eq!(fetcher.url(), "https://www.giantbomb.com/api/platforms/");

        let mut filter = FilterSpec::default();
        filter.push("name", "Atari");
        let request = PageRequest {
            sort: Some(SortSpec::new("release_date", SortDirection::Asc)),
            filter,
            field_list: vec!["name".to_string(), "original_price".to_string()],
            offset: 200,
        };
        let params = fetcher.query_params(&request);
        let get = |k: &str| params.iter().find(|(key, _)| *key == k).map(|(_, v)| v.as_str());

        assert_eq!(get("api_key"), Some("k3y"));
        assert_eq!(get("format"), Some("json"));
        assert_eq!(get("offset"), Some("200"));
        assert_eq!(get("limit"), Some("100"));
        assert_eq!(get("sort"), Some("release_date:asc"));
        assert_eq!(get("filter"), Some("name:Atari"));
        assert_eq!(get("field_list"), Some("name,original_price"));
    }

    #[test]
    fn http_query_params_omit_empty_options() {
        let fetcher = HttpPageFetcher::new(&CatalogConfig::new("k")).unwrap();
        let request = PageRequest {
            sort: None,
            filter: FilterSpec::default(),
            field_list: Vec::new(),
            offset: 0,
        };
        let keys: Vec<&str> = fetcher.query_params(&request).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["api_key", "format", "offset", "limit"]);
    }

    fn local_fetcher(base_url: String) -> HttpPageFetcher {
        let mut config = CatalogConfig::new("k");
        config.base_url = base_url;
        config.request_interval = Duration::ZERO;
        HttpPageFetcher::new(&config).unwrap()
    }

    fn first_page() -> PageRequest {
        PageRequest {
            sort: None,
            filter: FilterSpec::default(),
            field_list: Vec::new(),
            offset: 0,
        }
    }

    fn json_response(status: &str, body: &Value) -> Vec<u8> {
        let body = body.to_string();
        http_response(status, body.len(), &body)
    }

    #[test]
    fn http_fetch_decodes_page() {
        let body = page(1, vec![platform("Atari 2600", json!("199.99"))]);
        let fetcher = local_fetcher(serve_once(json_response("200 OK", &body)));

        let page = fetcher.fetch_page(&first_page()).unwrap();

        assert_eq!(page.total_results, 1);
        assert_eq!(page.results[0]["original_price"], json!(199.99));
    }

    #[test]
    fn http_error_status_is_transport() {
        let fetcher = local_fetcher(serve_once(http_response("503 Service Unavailable", 0, "")));

        let err = fetcher.fetch_page(&first_page()).unwrap_err();

        assert!(matches!(&err, AppError::Transport(msg) if msg.contains("503")));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn in_band_api_error_is_transport() {
        let body = json!({
            "error": "Invalid API Key",
            "status_code": 100,
            "number_of_total_results": 0,
            "number_of_page_results": 0,
            "results": [],
        });
        let fetcher = local_fetcher(serve_once(json_response("200 OK", &body)));

        let err = fetcher.fetch_page(&first_page()).unwrap_err();

        assert!(matches!(&err, AppError::Transport(msg) if msg.contains("Invalid API Key")));
    }

    #[test]
    fn http_body_that_is_not_json_is_malformed() {
        let fetcher = local_fetcher(serve_once(http_response("200 OK", 9, "<html/>!!")));

        assert!(matches!(
            fetcher.fetch_page(&first_page()),
            Err(AppError::MalformedInput(_))
        ));
    }
}
