use anyhow::Result;

use super::{AddressComponents, Coordinate, ReverseGeocoder};

/// Primary/secondary reverse-geocoding fan-out with fixed-priority fallback.
///
/// Every call queries both providers concurrently and waits for both to
/// finish. The primary result wins whenever it has one, even if it is sparser
/// than the secondary's; the secondary is used only when the primary failed
/// or came back empty. Nothing is cached and nothing is retried.
///
/// # Example
///
/// ```rust,no_run
/// use chicago_oracle::config::Config;
/// use chicago_oracle::geocode::to_display_string;
/// use chicago_oracle::pipeline::build_enricher;
///
/// # async fn example() {
/// let enricher = build_enricher(&Config::default());
/// let address = enricher.enrich(41.8781, -87.6298).await;
/// println!("{}", to_display_string(address.as_ref(), None));
/// # }
/// ```
pub struct AddressEnricher {
    primary: Box<dyn ReverseGeocoder>,
    secondary: Box<dyn ReverseGeocoder>,
}

impl AddressEnricher {
    pub fn new(primary: Box<dyn ReverseGeocoder>, secondary: Box<dyn ReverseGeocoder>) -> Self {
        Self { primary, secondary }
    }

    /// Provider names in priority order.
    pub fn provider_names(&self) -> [&str; 2] {
        [self.primary.name(), self.secondary.name()]
    }

    /// Best-effort address for a coordinate.
    ///
    /// Never fails: provider errors are logged and treated as "no result".
    /// `None` means neither provider produced an address.
    pub async fn enrich(&self, lat: f64, lng: f64) -> Option<AddressComponents> {
        let coordinate = Coordinate::new(lat, lng);

        // Both lookups run to completion; neither can cancel the other.
        let (primary, secondary) = tokio::join!(
            self.primary.reverse(coordinate),
            self.secondary.reverse(coordinate),
        );

        let primary = settle(self.primary.name(), coordinate, primary);
        let secondary = settle(self.secondary.name(), coordinate, secondary);

        if primary.is_some() {
            log::debug!("Using {} address for {coordinate}", self.primary.name());
            return primary;
        }
        if secondary.is_some() {
            log::debug!("Using {} address for {coordinate}", self.secondary.name());
            return secondary;
        }

        log::debug!("No address available for {coordinate}");
        None
    }
}

/// Collapse a provider outcome into "address or nothing", logging failures.
fn settle(
    provider: &str,
    coordinate: Coordinate,
    outcome: Result<Option<AddressComponents>>,
) -> Option<AddressComponents> {
    match outcome {
        Ok(Some(address)) => Some(address),
        Ok(None) => {
            log::debug!("{provider} returned no address for {coordinate}");
            None
        }
        Err(e) => {
            log::warn!("{provider} lookup failed for {coordinate}: {e:#}");
            None
        }
    }
}
