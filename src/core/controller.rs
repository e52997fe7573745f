//! Orchestrates rate fetching, conversion and persistence of the last result.

use super::amount::{convert_amount, parse_amount};
use super::currency::{CurrencyCode, RateSource, RateTable};
use super::error::ConversionError;
use super::state::{ConversionRequest, ConverterState};
use super::store::{LAST_RESULT_KEY, PersistenceStore};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns the converter state and mediates between user actions, the rate source and
/// the persistence store.
pub struct ConversionController {
    rate_source: Arc<dyn RateSource>,
    store: Arc<dyn PersistenceStore>,
    base_currency: CurrencyCode,
    timeout: Duration,
    state: Mutex<ConverterState>,
}

/// Clears the busy flag when dropped, including when the owning future is cancelled.
struct BusyGuard<'a> {
    state: &'a Mutex<ConverterState>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = std::mem::take(&mut *state).with_busy(false);
    }
}

impl ConversionController {
    pub fn new(
        rate_source: Arc<dyn RateSource>,
        store: Arc<dyn PersistenceStore>,
        base_currency: &str,
    ) -> Self {
        Self {
            rate_source,
            store,
            base_currency: base_currency.to_uppercase(),
            timeout: DEFAULT_TIMEOUT,
            state: Mutex::new(ConverterState::default()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ConverterState {
        self.lock().clone()
    }

    /// Loads the currency list and restores the last persisted result concurrently.
    /// Only the currency list failure is reported; a restore failure is logged.
    pub async fn initialize(&self) -> Result<(), ConversionError> {
        let (loaded, _) = futures::join!(self.load_currency_list(), self.restore_last_result());
        loaded.map(|_| ())
    }

    /// Fetches the rate table for the base currency and installs its codes as the
    /// currency list, resetting the selection to the defaults.
    pub async fn load_currency_list(&self) -> Result<Vec<CurrencyCode>, ConversionError> {
        let _busy = self.begin_busy()?;
        let table = self
            .fetch_rates(&self.base_currency)
            .await
            .inspect_err(|e| error!("Error fetching currencies: {e}"))?;

        let codes = table.codes();
        debug!(count = codes.len(), "Loaded currency list");
        self.update(|state| state.with_currencies(codes.clone(), &self.base_currency));
        Ok(codes)
    }

    /// Shows the persisted last result, if any. Read failures are only logged.
    pub async fn restore_last_result(&self) -> Option<String> {
        match self.store.get_item(LAST_RESULT_KEY).await {
            Ok(Some(value)) if !value.is_empty() => {
                debug!(%value, "Restored last conversion result");
                self.update(|state| state.with_result(&value));
                Some(value)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Error retrieving last conversion amount: {e}");
                None
            }
        }
    }

    /// Converts using the amount and currencies currently held in the state.
    pub async fn convert(&self) -> Result<String, ConversionError> {
        let request = self.state().request()?;
        self.convert_request(&request).await
    }

    /// Converts `request`, updating the displayed result and persisting it on success.
    /// On failure the displayed result and the persisted value are left untouched.
    #[instrument(name = "Convert", skip(self), fields(from = %request.from, to = %request.to))]
    pub async fn convert_request(
        &self,
        request: &ConversionRequest,
    ) -> Result<String, ConversionError> {
        let amount = parse_amount(&request.amount)?;
        let _busy = self.begin_busy()?;

        let table = self
            .fetch_rates(&request.from)
            .await
            .inspect_err(|e| error!("Error converting currency: {e}"))?;
        self.update(|state| state.with_refreshed_currencies(table.codes()));

        let rate = table
            .rate(&request.to)
            .ok_or_else(|| ConversionError::MissingRate {
                from: request.from.clone(),
                to: request.to.clone(),
            })?;
        let result = convert_amount(amount, rate).ok_or_else(|| ConversionError::OutOfRange {
            from: request.from.clone(),
            to: request.to.clone(),
        })?;

        debug!(%result, rate, "Conversion complete");
        self.update(|state| state.with_result(&result));
        self.persist_last_result(&result).await;
        Ok(result)
    }

    pub fn set_amount(&self, amount: &str) {
        self.update(|state| state.with_amount(amount));
    }

    pub fn select_from(&self, code: &str) -> Result<(), ConversionError> {
        let next = self.state().select_from(code)?;
        self.update(|state| ConverterState { from: next.from, ..state });
        Ok(())
    }

    pub fn select_to(&self, code: &str) -> Result<(), ConversionError> {
        let next = self.state().select_to(code)?;
        self.update(|state| ConverterState { to: next.to, ..state });
        Ok(())
    }

    pub fn swap(&self) {
        self.update(ConverterState::swapped);
    }

    /// Empties the amount and result. The persisted value is kept. Rejected while a
    /// fetch is in flight.
    pub fn clear(&self) -> Result<(), ConversionError> {
        let mut state = self.lock();
        if state.busy {
            return Err(ConversionError::Busy);
        }
        *state = std::mem::take(&mut *state).cleared();
        Ok(())
    }

    /// Writes `value` under the last result key. Write failures are only logged.
    pub async fn persist_last_result(&self, value: &str) {
        if let Err(e) = self.store.set_item(LAST_RESULT_KEY, value).await {
            warn!("Error saving last conversion amount: {e}");
        }
    }

    async fn fetch_rates(&self, base: &str) -> Result<RateTable, ConversionError> {
        tokio::time::timeout(self.timeout, self.rate_source.fetch_rates(base))
            .await
            .map_err(|_| {
                ConversionError::rate_fetch(
                    base,
                    format!("timed out after {}s", self.timeout.as_secs_f64()),
                )
            })?
    }

    fn begin_busy(&self) -> Result<BusyGuard<'_>, ConversionError> {
        let mut state = self.lock();
        if state.busy {
            return Err(ConversionError::Busy);
        }
        *state = std::mem::take(&mut *state).with_busy(true);
        Ok(BusyGuard { state: &self.state })
    }

    fn update(&self, transition: impl FnOnce(ConverterState) -> ConverterState) {
        let mut state = self.lock();
        let current = std::mem::take(&mut *state);
        *state = transition(current);
    }

    fn lock(&self) -> MutexGuard<'_, ConverterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockRateSource {
        tables: HashMap<String, BTreeMap<String, f64>>,
        delay: Option<Duration>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl MockRateSource {
        fn new() -> Self {
            let usd = BTreeMap::from([
                ("USD".to_string(), 1.0),
                ("EUR".to_string(), 0.9),
                ("JPY".to_string(), 150.0),
            ]);
            let eur = BTreeMap::from([
                ("EUR".to_string(), 1.0),
                ("USD".to_string(), 1.1),
                ("JPY".to_string(), 165.0),
            ]);
            Self {
                tables: HashMap::from([("USD".to_string(), usd), ("EUR".to_string(), eur)]),
                delay: None,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn delayed(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::new()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateSource for MockRateSource {
        async fn fetch_rates(&self, base: &str) -> Result<RateTable, ConversionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(ConversionError::rate_fetch(base, "connection refused"));
            }
            self.tables
                .get(base)
                .map(|rates| RateTable::new(base, rates.clone()))
                .ok_or_else(|| ConversionError::rate_fetch(base, "HTTP error: 404 Not Found"))
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl PersistenceStore for BrokenStore {
        async fn get_item(&self, _key: &str) -> Result<Option<String>, ConversionError> {
            Err(ConversionError::Storage("read failed".to_string()))
        }

        async fn set_item(&self, _key: &str, _value: &str) -> Result<(), ConversionError> {
            Err(ConversionError::Storage("write failed".to_string()))
        }
    }

    fn controller(
        source: &Arc<MockRateSource>,
        store: &Arc<MemoryStore>,
    ) -> ConversionController {
        ConversionController::new(source.clone(), store.clone(), "USD")
    }

    #[tokio::test]
    async fn test_initialize_loads_currencies_and_defaults() {
        let source = Arc::new(MockRateSource::new());
        let store = Arc::new(MemoryStore::new());
        let controller = controller(&source, &store);

        controller.initialize().await.unwrap();

        let state = controller.state();
        assert_eq!(state.currencies, vec!["EUR", "JPY", "USD"]);
        assert_eq!(state.from.as_deref(), Some("USD"));
        assert_eq!(state.to.as_deref(), Some("EUR"));
        assert!(state.result.is_empty());
        assert!(!state.busy);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_initialize_failure_leaves_no_currencies() {
        let source = Arc::new(MockRateSource::failing());
        let store = Arc::new(MemoryStore::new());
        store.set_item(LAST_RESULT_KEY, "9.00").await.unwrap();
        let controller = controller(&source, &store);

        let result = controller.initialize().await;
        assert!(matches!(result, Err(ConversionError::RateFetch { .. })));

        let state = controller.state();
        assert!(state.currencies.is_empty());
        assert!(state.from.is_none());
        assert_eq!(state.result, "9.00");
        assert!(!state.busy);
    }

    #[tokio::test]
    async fn test_convert_scenario() {
        let source = Arc::new(MockRateSource::new());
        let store = Arc::new(MemoryStore::new());
        let controller = controller(&source, &store);
        controller.initialize().await.unwrap();

        controller.set_amount("10");
        let result = controller.convert().await.unwrap();

        assert_eq!(result, "9.00");
        assert_eq!(controller.state().result, "9.00");
        assert_eq!(
            store.get_item(LAST_RESULT_KEY).await.unwrap().as_deref(),
            Some("9.00")
        );
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_convert_invalid_amount_skips_fetch() {
        let source = Arc::new(MockRateSource::new());
        let store = Arc::new(MemoryStore::new());
        let controller = controller(&source, &store);
        controller.initialize().await.unwrap();
        controller.set_amount("10");
        controller.convert().await.unwrap();

        for amount in ["abc", "", "  "] {
            controller.set_amount(amount);
            let result = controller.convert().await;
            assert!(matches!(result, Err(ConversionError::Validation(_))));
        }

        assert_eq!(source.calls(), 2);
        assert_eq!(controller.state().result, "9.00");
    }

    #[tokio::test]
    async fn test_convert_fetch_failure_keeps_result_and_persisted_value() {
        let store = Arc::new(MemoryStore::new());
        store.set_item(LAST_RESULT_KEY, "4.20").await.unwrap();

        let source = Arc::new(MockRateSource::failing());
        let controller = controller(&source, &store);
        controller.restore_last_result().await;

        let request = ConversionRequest {
            amount: "10".to_string(),
            from: "USD".to_string(),
            to: "EUR".to_string(),
        };
        let result = controller.convert_request(&request).await;

        assert!(matches!(result, Err(ConversionError::RateFetch { .. })));
        assert_eq!(controller.state().result, "4.20");
        assert_eq!(
            store.get_item(LAST_RESULT_KEY).await.unwrap().as_deref(),
            Some("4.20")
        );
        assert!(!controller.state().busy);
    }

    #[tokio::test]
    async fn test_convert_missing_rate_is_an_error() {
        let source = Arc::new(MockRateSource::new());
        let store = Arc::new(MemoryStore::new());
        let controller = controller(&source, &store);

        let request = ConversionRequest {
            amount: "10".to_string(),
            from: "USD".to_string(),
            to: "GBP".to_string(),
        };
        let result = controller.convert_request(&request).await;

        assert!(matches!(result, Err(ConversionError::MissingRate { .. })));
        assert!(controller.state().result.is_empty());
        assert!(store.get_item(LAST_RESULT_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_convert_refreshes_currency_list_from_source_base() {
        let source = Arc::new(MockRateSource::new());
        let store = Arc::new(MemoryStore::new());
        let controller = controller(&source, &store);
        controller.initialize().await.unwrap();

        controller.swap();
        controller.set_amount("2");
        let result = controller.convert().await.unwrap();

        assert_eq!(result, "2.20");
        let state = controller.state();
        assert_eq!(state.from.as_deref(), Some("EUR"));
        assert_eq!(state.to.as_deref(), Some("USD"));
    }

    #[tokio::test]
    async fn test_restart_restores_without_recomputing() {
        let store = Arc::new(MemoryStore::new());
        let source = Arc::new(MockRateSource::new());
        {
            let controller = controller(&source, &store);
            controller.initialize().await.unwrap();
            controller.set_amount("10");
            controller.convert().await.unwrap();
        }

        let fresh_source = Arc::new(MockRateSource::new());
        let controller = controller(&fresh_source, &store);
        let restored = controller.restore_last_result().await;

        assert_eq!(restored.as_deref(), Some("9.00"));
        assert_eq!(controller.state().result, "9.00");
        assert_eq!(fresh_source.calls(), 0);
    }

    #[tokio::test]
    async fn test_clear_keeps_persisted_value() {
        let source = Arc::new(MockRateSource::new());
        let store = Arc::new(MemoryStore::new());
        let controller = controller(&source, &store);
        controller.initialize().await.unwrap();
        controller.set_amount("10");
        controller.convert().await.unwrap();

        controller.clear().unwrap();
        let once = controller.state();
        controller.clear().unwrap();
        let twice = controller.state();

        assert_eq!(once, twice);
        assert!(twice.amount.is_empty());
        assert!(twice.result.is_empty());
        assert_eq!(twice.currencies.len(), 3);
        assert_eq!(
            store.get_item(LAST_RESULT_KEY).await.unwrap().as_deref(),
            Some("9.00")
        );
    }

    #[tokio::test]
    async fn test_swap_twice_restores_selection() {
        let source = Arc::new(MockRateSource::new());
        let store = Arc::new(MemoryStore::new());
        let controller = controller(&source, &store);
        controller.initialize().await.unwrap();
        controller.select_to("JPY").unwrap();

        controller.swap();
        let swapped = controller.state();
        assert_eq!(swapped.from.as_deref(), Some("JPY"));
        assert_eq!(swapped.to.as_deref(), Some("USD"));

        controller.swap();
        let restored = controller.state();
        assert_eq!(restored.from.as_deref(), Some("USD"));
        assert_eq!(restored.to.as_deref(), Some("JPY"));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_select_unknown_currency_is_rejected() {
        let source = Arc::new(MockRateSource::new());
        let store = Arc::new(MemoryStore::new());
        let controller = controller(&source, &store);
        controller.initialize().await.unwrap();

        assert!(controller.select_from("GBP").is_err());
        assert_eq!(controller.state().from.as_deref(), Some("USD"));
    }

    #[tokio::test]
    async fn test_storage_failures_are_silent() {
        let source = Arc::new(MockRateSource::new());
        let controller = ConversionController::new(source.clone(), Arc::new(BrokenStore), "USD");

        controller.initialize().await.unwrap();
        assert!(controller.state().result.is_empty());

        controller.set_amount("10");
        let result = controller.convert().await.unwrap();
        assert_eq!(result, "9.00");
        assert_eq!(controller.state().result, "9.00");
    }

    #[tokio::test]
    async fn test_busy_flag_rejects_concurrent_convert() {
        let source = Arc::new(MockRateSource::delayed(Duration::from_millis(100)));
        let store = Arc::new(MemoryStore::new());
        let controller = controller(&source, &store);
        let request = ConversionRequest {
            amount: "10".to_string(),
            from: "USD".to_string(),
            to: "EUR".to_string(),
        };

        let (first, second) = futures::join!(controller.convert_request(&request), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            assert!(controller.state().busy);
            controller.convert_request(&request).await
        });

        assert_eq!(first.unwrap(), "9.00");
        assert!(matches!(second, Err(ConversionError::Busy)));
        assert_eq!(source.calls(), 1);
        assert!(!controller.state().busy);
    }

    #[tokio::test]
    async fn test_busy_flag_rejects_clear_during_convert() {
        let source = Arc::new(MockRateSource::delayed(Duration::from_millis(100)));
        let store = Arc::new(MemoryStore::new());
        let controller = controller(&source, &store);
        let request = ConversionRequest {
            amount: "10".to_string(),
            from: "USD".to_string(),
            to: "EUR".to_string(),
        };

        let (converted, cleared) = futures::join!(controller.convert_request(&request), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            controller.clear()
        });

        assert_eq!(converted.unwrap(), "9.00");
        assert!(matches!(cleared, Err(ConversionError::Busy)));
        assert_eq!(controller.state().result, "9.00");

        controller.clear().unwrap();
        assert!(controller.state().result.is_empty());
    }

    #[tokio::test]
    async fn test_unrepresentable_result_is_not_a_validation_error() {
        let source = Arc::new(MockRateSource::new());
        let store = Arc::new(MemoryStore::new());
        let controller = controller(&source, &store);
        let request = ConversionRequest {
            amount: "1e29".to_string(),
            from: "USD".to_string(),
            to: "JPY".to_string(),
        };

        let result = controller.convert_request(&request).await;

        assert!(matches!(result, Err(ConversionError::OutOfRange { .. })));
        assert_eq!(source.calls(), 1);
        assert!(controller.state().result.is_empty());
        assert!(store.get_item(LAST_RESULT_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_timeout_releases_busy_flag() {
        let source = Arc::new(MockRateSource::delayed(Duration::from_millis(200)));
        let store = Arc::new(MemoryStore::new());
        let controller = controller(&source, &store).with_timeout(Duration::from_millis(20));

        let result = controller.load_currency_list().await;

        match result {
            Err(ConversionError::RateFetch { message, .. }) => {
                assert!(message.contains("timed out"))
            }
            other => panic!("Expected a timeout error, got {other:?}"),
        }
        assert!(!controller.state().busy);
        assert!(controller.state().currencies.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_convert_releases_busy_flag() {
        let source = Arc::new(MockRateSource::delayed(Duration::from_millis(200)));
        let store = Arc::new(MemoryStore::new());
        let controller = controller(&source, &store);
        let request = ConversionRequest {
            amount: "10".to_string(),
            from: "USD".to_string(),
            to: "EUR".to_string(),
        };

        let cancelled = tokio::time::timeout(
            Duration::from_millis(20),
            controller.convert_request(&request),
        )
        .await;

        assert!(cancelled.is_err());
        assert!(!controller.state().busy);
    }
}
