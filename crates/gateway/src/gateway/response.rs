//! Normalization of raw search responses into [`QueryResult`].

use serde_json::Value;

use crate::error::{BackendError, GatewayResult};
use crate::types::{Document, QueryRequest, QueryResult};

/// Converts a raw `{"hits": {...}}` response into the result envelope.
///
/// The total is read from `hits.total.value` (or a bare integer `hits.total`),
/// items are each hit's `_source`, and page links are derived from the
/// request's pagination.
pub(crate) fn normalize(response: &Value, request: &QueryRequest) -> GatewayResult<QueryResult> {
    let hits = response
        .get("hits")
        .ok_or_else(|| malformed("missing 'hits'"))?;

    let total_count = match hits.get("total") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(total) => total.get("value").and_then(Value::as_u64),
        None => None,
    }
    .ok_or_else(|| malformed("missing 'hits.total'"))?;

    let items: Vec<Document> = hits
        .get("hits")
        .and_then(Value::as_array)
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| hit.get("_source").and_then(Value::as_object).cloned())
                .collect()
        })
        .unwrap_or_default();

    let (previous_page, next_page) = page_links(request, total_count);

    Ok(QueryResult {
        total_count,
        items,
        previous_page,
        next_page,
    })
}

/// Previous/next page numbers from the request's page and page size.
///
/// Links are derived even when `paginate` is off; a zero page or page size
/// yields none.
pub(crate) fn page_links(request: &QueryRequest, total_count: u64) -> (Option<u32>, Option<u32>) {
    if request.page == 0 || request.page_size == 0 {
        return (None, None);
    }

    let page = request.page;
    let previous = (page > 1).then(|| page - 1);
    let shown = u64::from(page) * u64::from(request.page_size);
    let next = if shown < total_count {
        page.checked_add(1)
    } else {
        None
    };
    (previous, next)
}

fn malformed(detail: &str) -> crate::error::GatewayError {
    BackendError::SerializationError {
        message: format!("unexpected search response: {}", detail),
    }
    .into()
}
