use std::future::Future;

use crate::ports::{Page, ServiceError};

/// Fetches pages of `page_size` until the requested offset reaches the reported total.
///
/// Without a reported total the first short page ends the listing. An empty page always does,
/// so a service that over-reports its total cannot keep the loop going forever. Both checks
/// count the raw entries of a page, so entries the adapter skipped never end the listing.
pub async fn fetch_all_pages<T, F, Fut>(page_size: usize, mut fetch: F) -> Result<Vec<T>, ServiceError>
where
    F: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = Result<Page<T>, ServiceError>>,
{
    let mut items = Vec::new();
    let mut offset = 0;

    loop {
        let page = fetch(offset, page_size).await?;
        let received = page.fetched;
        items.extend(page.items);
        offset += page_size;

        let more = match page.total {
            Some(total) => offset < total,
            None => received >= page_size,
        };
        if !more || received == 0 {
            break;
        }
    }

    Ok(items)
}
