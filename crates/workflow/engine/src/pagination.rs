//! Pagination-driven fan-out/fan-in
//!
//! A listing is read page by page through the `ListItems` capability. Each
//! non-empty page immediately launches one `ConvertToParquet` call over
//! exactly that page's items, so conversions overlap the listing of later
//! pages. Once the listing ends every launched call is awaited, failed or
//! not, before the outcome is reported.

use crate::capabilities;
use crate::context::{OrchestrationContext, PendingActivity};
use crate::error::InvocationError;
use futures::future::join_all;
use futures::stream::{self, Stream, StreamExt};
use workflow_types::{
    CompoundConversionRequest, ConversionReport, ItemPage, ListItemsRequest, PaginationCursor,
    StorageLocation,
};

/// Lazy sequence of listing pages.
///
/// The first page is requested without a token; each following page with
/// the token the previous one returned. The sequence ends after a page
/// without a token, or after the first listing failure. Calling this again
/// starts a fresh listing.
pub fn pages(
    ctx: &OrchestrationContext,
    location: StorageLocation,
    page_size: i64,
) -> impl Stream<Item = Result<PaginationCursor, InvocationError>> + '_ {
    // `None` once the listing is finished; otherwise the token for the next page
    stream::unfold(Some(None::<String>), move |state| {
        let location = location.clone();
        async move {
            let continuation_token = state?;
            let request = ListItemsRequest::new(location, continuation_token.clone(), page_size);

            match ctx
                .invoke::<_, ItemPage>(capabilities::LIST_ITEMS, request)
                .await
            {
                Ok(page) => {
                    let next = page
                        .continuation_token
                        .filter(|token| !token.is_empty())
                        .map(Some);
                    let cursor = PaginationCursor {
                        continuation_token,
                        page_size,
                        item_names: page.item_names,
                    };
                    Some((Ok(cursor), next))
                }
                Err(e) => Some((Err(e), None)),
            }
        }
    })
}

/// Outcome of one page's conversion
#[derive(Debug)]
pub struct BatchOutcome {
    /// Zero-based launch order
    pub index: usize,
    pub item_names: Vec<String>,
    pub result: Result<ConversionReport, InvocationError>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Joined outcome of every launched batch
#[derive(Debug, Default)]
pub struct FanInOutcome {
    /// One entry per launched batch, in launch order
    pub batches: Vec<BatchOutcome>,
    /// Set when the listing stopped on an error
    pub listing_error: Option<InvocationError>,
}

impl FanInOutcome {
    /// Every batch succeeded and the listing ran to its end.
    /// Zero batches is a success.
    pub fn is_success(&self) -> bool {
        self.listing_error.is_none() && self.batches.iter().all(BatchOutcome::is_success)
    }

    pub fn failed_count(&self) -> usize {
        self.batches.iter().filter(|b| !b.is_success()).count()
    }

    pub fn succeeded_count(&self) -> usize {
        self.batches.len() - self.failed_count()
    }

    /// Items reported converted across all successful batches
    pub fn converted_count(&self) -> usize {
        self.batches
            .iter()
            .filter_map(|b| b.result.as_ref().ok())
            .map(|report| report.converted.len())
            .sum()
    }
}

struct Launched {
    index: usize,
    item_names: Vec<String>,
    pending: Result<PendingActivity<ConversionReport>, InvocationError>,
}

#[derive(Default)]
struct Launches {
    launched: Vec<Launched>,
    listing_error: Option<InvocationError>,
}

/// List `source` page by page, converting each page into `destination`
pub async fn fan_out_fan_in(
    ctx: &OrchestrationContext,
    source: &StorageLocation,
    destination: &StorageLocation,
    page_size: i64,
) -> FanInOutcome {
    let launches = pages(ctx, source.clone(), page_size)
        .fold(Launches::default(), move |mut launches, page| async move {
            match page {
                Ok(cursor) if cursor.item_names.is_empty() => {
                    tracing::debug!(
                        workflow = %ctx.workflow(),
                        token = ?cursor.continuation_token,
                        "Empty page, nothing to launch"
                    );
                }
                Ok(cursor) => {
                    let index = launches.launched.len();
                    let request = CompoundConversionRequest::new(
                        source.clone(),
                        destination.clone(),
                        cursor.item_names.clone(),
                    );
                    tracing::debug!(
                        workflow = %ctx.workflow(),
                        batch = index,
                        items = cursor.item_names.len(),
                        "Launching conversion batch"
                    );
                    launches.launched.push(Launched {
                        index,
                        item_names: cursor.item_names,
                        pending: ctx.schedule(capabilities::CONVERT_TO_PARQUET, request),
                    });
                }
                Err(e) => launches.listing_error = Some(e),
            }
            launches
        })
        .await;

    let batches = join_all(launches.launched.into_iter().map(|launched| async move {
        let result = match launched.pending {
            Ok(pending) => pending.outcome().await,
            Err(e) => Err(e),
        };
        BatchOutcome {
            index: launched.index,
            item_names: launched.item_names,
            result,
        }
    }))
    .await;

    tracing::info!(
        workflow = %ctx.workflow(),
        batches = batches.len(),
        listing_failed = launches.listing_error.is_some(),
        "Fan-in complete"
    );

    FanInOutcome {
        batches,
        listing_error: launches.listing_error,
    }
}
