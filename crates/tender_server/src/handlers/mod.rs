pub mod bids;
pub mod tenders;

/// `GET /api/ping`
pub async fn ping() -> &'static str {
    "ok"
}
