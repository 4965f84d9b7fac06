use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::models::listing::{Category, Coordinate, Listing, Store};
use crate::source::{CandidateSet, ListingSource, SourceError};

pub struct HttpListingSource {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpListingSource {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SourceError::Transport(format!("failed to build http client: {err}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client,
        })
    }
}

#[async_trait]
impl ListingSource for HttpListingSource {
    async fn fetch_candidates(
        &self,
        origin: &Coordinate,
        radius_km: f64,
    ) -> Result<CandidateSet, SourceError> {
        let mut request = self
            .client
            .get(format!("{}/foods/nearby", self.base_url))
            .query(&[
                ("latitude", origin.lat),
                ("longitude", origin.lng),
                ("radius", radius_km),
            ]);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, "listing source returned an error status");
            return Err(SourceError::Status { status, body });
        }

        let records: Vec<FoodRecord> = response
            .json()
            .await
            .map_err(|err| SourceError::Malformed(err.to_string()))?;

        into_candidates(records)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FoodRecord {
    id: serde_json::Value,
    name: String,
    #[serde(default)]
    description: Option<String>,
    price: f64,
    original_price: f64,
    available_quantity: i64,
    expiry_date: String,
    store_id: serde_json::Value,
    #[serde(default)]
    store_name: Option<String>,
    store_location: StoreLocationRecord,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    image_url: Option<String>,
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct StoreLocationRecord {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    address: Option<String>,
}

fn into_candidates(records: Vec<FoodRecord>) -> Result<CandidateSet, SourceError> {
    let mut listings = Vec::with_capacity(records.len());
    let mut stores = HashMap::new();

    for record in records {
        let id = id_string(&record.id, "id")?;
        let store_id = id_string(&record.store_id, "storeId")?;
        let location = Coordinate::new(
            record.store_location.latitude,
            record.store_location.longitude,
        );

        if let Some(store_name) = record.store_name {
            stores.entry(store_id.clone()).or_insert_with(|| Store {
                id: store_id.clone(),
                name: store_name,
                location,
                address: record.store_location.address.clone(),
            });
        }

        let available_quantity = u32::try_from(record.available_quantity).map_err(|_| {
            SourceError::Malformed(format!(
                "listing {id} has invalid quantity {}",
                record.available_quantity
            ))
        })?;

        let listing = Listing {
            price: whole_amount(record.price, &id, "price")?,
            original_price: whole_amount(record.original_price, &id, "originalPrice")?,
            available_quantity,
            expiry_at: parse_timestamp(&record.expiry_date, &id, "expiryDate")?,
            created_at: parse_timestamp(&record.created_at, &id, "createdAt")?,
            category: Category::parse(record.category.as_deref().unwrap_or("other")),
            tags: record.tags.into_iter().collect::<BTreeSet<_>>(),
            name: record.name,
            description: record.description.unwrap_or_default(),
            image_url: record.image_url,
            store_id,
            location,
            id,
        };

        listing.check_invariants().map_err(SourceError::Malformed)?;
        listings.push(listing);
    }

    Ok(CandidateSet { listings, stores })
}

fn id_string(value: &serde_json::Value, field: &str) -> Result<String, SourceError> {
    match value {
        serde_json::Value::String(id) if !id.is_empty() => Ok(id.clone()),
        serde_json::Value::Number(id) => Ok(id.to_string()),
        other => Err(SourceError::Malformed(format!("invalid {field}: {other}"))),
    }
}

/// Prices are whole currency units; a fractional amount is rejected, never rounded.
fn whole_amount(amount: f64, id: &str, field: &str) -> Result<u32, SourceError> {
    if !amount.is_finite() || amount < 0.0 || amount > f64::from(u32::MAX) {
        return Err(SourceError::Malformed(format!(
            "listing {id} has invalid {field} {amount}"
        )));
    }
    if amount.fract() != 0.0 {
        return Err(SourceError::Malformed(format!(
            "listing {id} has fractional {field} {amount}"
        )));
    }
    Ok(amount as u32)
}

/// RFC 3339, or a zone-less local date-time which the backend emits in UTC.
fn parse_timestamp(raw: &str, id: &str, field: &str) -> Result<DateTime<Utc>, SourceError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|err| {
            SourceError::Malformed(format!("listing {id} has invalid {field} {raw:?}: {err}"))
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::extract::Query;
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::{into_candidates, FoodRecord, HttpListingSource};
    use crate::models::listing::{Category, Coordinate};
    use crate::source::{ListingSource, SourceError};

    fn records(value: serde_json::Value) -> Vec<FoodRecord> {
        serde_json::from_value(value).unwrap()
    }

    fn food(id: serde_json::Value, price: f64, original_price: f64) -> serde_json::Value {
        json!({
            "id": id,
            "name": "唐揚げ弁当",
            "description": "本日製造",
            "price": price,
            "originalPrice": original_price,
            "quantity": 5,
            "availableQuantity": 3,
            "imageUrl": "https://example.com/bento.jpg",
            "expiryDate": "2024-01-15T18:00:00",
            "storeId": 7,
            "storeName": "Corner Mart",
            "storeLocation": { "latitude": 35.68, "longitude": 139.65, "address": "Tokyo" },
            "category": "お弁当",
            "tags": ["halal", "hot"],
            "createdAt": "2024-01-14T09:30:00Z",
            "updatedAt": "2024-01-14T09:30:00Z"
        })
    }

    #[test]
    fn converts_backend_records() {
        let set = into_candidates(records(json!([food(json!(42), 300.0, 500.0)]))).unwrap();

        assert_eq!(set.listings.len(), 1);
        let listing = &set.listings[0];
        assert_eq!(listing.id, "42");
        assert_eq!(listing.store_id, "7");
        assert_eq!(listing.price, 300);
        assert_eq!(listing.original_price, 500);
        assert_eq!(listing.available_quantity, 3);
        assert_eq!(listing.category, Category::Bento);
        assert_eq!(listing.location, Coordinate::new(35.68, 139.65));
        assert_eq!(
            listing.expiry_at,
            Utc.with_ymd_and_hms(2024, 1, 15, 18, 0, 0).unwrap()
        );
        assert!(listing.tags.contains("halal"));

        let store = set.stores.get("7").unwrap();
        assert_eq!(store.name, "Corner Mart");
        assert_eq!(store.address.as_deref(), Some("Tokyo"));
    }

    #[test]
    fn price_above_original_is_malformed() {
        let err = into_candidates(records(json!([food(json!("a"), 600.0, 500.0)]))).unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[test]
    fn bad_timestamp_is_malformed() {
        let mut record = food(json!("a"), 100.0, 500.0);
        record["expiryDate"] = json!("next tuesday");
        let err = into_candidates(records(json!([record]))).unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[test]
    fn fractional_price_is_rejected() {
        let err = into_candidates(records(json!([food(json!("a"), 299.5, 299.4)]))).unwrap_err();
        match err {
            SourceError::Malformed(message) => assert!(message.contains("fractional price")),
            other => panic!("expected malformed, got {other:?}"),
        }
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    type SeenRequest = (HashMap<String, String>, Option<String>);

    fn recording_backend(seen: Arc<Mutex<Vec<SeenRequest>>>) -> Router {
        Router::new().route(
            "/api/foods/nearby",
            get(
                move |Query(params): Query<HashMap<String, String>>, headers: HeaderMap| {
                    let seen = seen.clone();
                    async move {
                        let auth = headers
                            .get(header::AUTHORIZATION)
                            .and_then(|value| value.to_str().ok())
                            .map(str::to_string);
                        seen.lock().unwrap().push((params, auth));
                        Json(json!([food(json!(1), 300.0, 500.0)]))
                    }
                },
            ),
        )
    }

    #[tokio::test]
    async fn sends_origin_radius_and_bearer_token() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let base_url = serve(recording_backend(seen.clone())).await;
        let source = HttpListingSource::new(
            format!("{base_url}/"),
            Some("secret-token".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        let set = source
            .fetch_candidates(&Coordinate::new(35.68, 139.65), 2.5)
            .await
            .unwrap();
        assert_eq!(set.listings.len(), 1);
        assert_eq!(set.listings[0].id, "1");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (params, auth) = &seen[0];
        let number = |key: &str| params.get(key).unwrap().parse::<f64>().unwrap();
        assert_eq!(number("latitude"), 35.68);
        assert_eq!(number("longitude"), 139.65);
        assert_eq!(number("radius"), 2.5);
        assert_eq!(auth.as_deref(), Some("Bearer secret-token"));
    }

    #[tokio::test]
    async fn no_token_sends_no_authorization_header() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let base_url = serve(recording_backend(seen.clone())).await;
        let source = HttpListingSource::new(base_url, None, Duration::from_secs(5)).unwrap();

        source
            .fetch_candidates(&Coordinate::new(35.68, 139.65), 5.0)
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].1, None);
    }

    #[tokio::test]
    async fn error_status_is_reported_with_body() {
        let backend = Router::new().route(
            "/api/foods/nearby",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base_url = serve(backend).await;
        let source = HttpListingSource::new(base_url, None, Duration::from_secs(5)).unwrap();

        let err = source
            .fetch_candidates(&Coordinate::new(35.68, 139.65), 5.0)
            .await
            .unwrap_err();

        match err {
            SourceError::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream down");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let backend = Router::new().route("/api/foods/nearby", get(|| async { "not json" }));
        let base_url = serve(backend).await;
        let source = HttpListingSource::new(base_url, None, Duration::from_secs(5)).unwrap();

        let err = source
            .fetch_candidates(&Coordinate::new(35.68, 139.65), 5.0)
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let timeout = Duration::from_millis(500);
        let source = HttpListingSource::new("http://127.0.0.1:1/api", None, timeout).unwrap();

        let err = source
            .fetch_candidates(&Coordinate::new(35.68, 139.65), 5.0)
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Transport(_)));
    }
}
