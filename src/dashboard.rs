//! Dashboard tiles: collection totals fetched side by side.

use log::warn;
use serde::Serialize;

use crate::query::{PageQuery, PageResult};
use crate::resource::Resource;
use crate::resources::{Account, Landmark, Product, Trip};
use crate::transport::Transport;

/// Totals shown on the dashboard. `None` marks a tile whose count could
/// not be fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub accounts: Option<u64>,
    pub places: Option<u64>,
    pub trips: Option<u64>,
    pub products: Option<u64>,
}

impl DashboardSummary {
    /// Fetch every total concurrently. One failing tile does not affect
    /// the others.
    pub async fn collect<T: Transport + ?Sized>(transport: &T) -> Self {
        let (accounts, places, trips, products) = tokio::join!(
            count::<Account, T>(transport),
            count::<Landmark, T>(transport),
            count::<Trip, T>(transport),
            count::<Product, T>(transport),
        );
        Self {
            accounts,
            places,
            trips,
            products,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.accounts.is_some()
            && self.places.is_some()
            && self.trips.is_some()
            && self.products.is_some()
    }
}

async fn count<R: Resource, T: Transport + ?Sized>(transport: &T) -> Option<u64> {
    let query = PageQuery::new(1);
    let page = match transport.list(R::PATH, &query).await {
        Ok(body) => PageResult::<R>::decode(body),
        Err(err) => Err(err),
    };
    match page {
        Ok(page) => Some(page.total_count),
        Err(err) => {
            warn!("dashboard count for {} failed: {}", R::PATH, err);
            None
        }
    }
}
