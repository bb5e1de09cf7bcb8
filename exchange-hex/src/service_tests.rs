//! ConversionService unit tests.

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use exchange_types::domain::money;
    use exchange_types::{
        AppError, Cache, CacheError, ConvertError, ConvertQuery, ConvertResponse, CurrencyCode,
        FeeError, FeeProvider, RateProvider,
    };

    use crate::ConversionService;

    /// In-memory cache that records TTLs and can be switched to fail.
    #[derive(Default)]
    pub struct MockCache {
        entries: Mutex<HashMap<String, (String, Duration)>>,
        failing: bool,
    }

    impl MockCache {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                failing: true,
                ..Self::default()
            }
        }

        pub fn entry(&self, key: &str) -> Option<(String, Duration)> {
            self.entries.lock().unwrap().get(key).cloned()
        }

        pub fn len(&self) -> usize {
            self.entries.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Cache for MockCache {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            if self.failing {
                return Err(CacheError::Backend("connection refused".into()));
            }
            Ok(self.entries.lock().unwrap().get(key).map(|(v, _)| v.clone()))
        }

        async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
            if self.failing {
                return Err(CacheError::Backend("connection refused".into()));
            }
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value.to_string(), ttl));
            Ok(())
        }
    }

    /// What the mock provider answers with.
    #[derive(Clone, Copy)]
    pub enum Answer {
        /// Multiplies the amount by this factor.
        Rate(f64),
        MissingKey,
        Unavailable,
    }

    pub struct MockProvider {
        answer: Answer,
        calls: AtomicUsize,
    }

    impl MockProvider {
        pub fn new(answer: Answer) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn convert(
            &self,
            _cancel: &CancellationToken,
            from: &CurrencyCode,
            to: &CurrencyCode,
            amount: i64,
        ) -> Result<i64, ConvertError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if from == to {
                return Ok(amount);
            }
            match self.answer {
                Answer::Rate(rate) => Ok(money::round_cents(amount as f64 * rate)?),
                Answer::MissingKey => Err(ConvertError::MissingApiKey { info: None }),
                Answer::Unavailable => Err(ConvertError::Transport("connect timeout".into())),
            }
        }
    }

    pub struct MockFee(pub Option<f64>);

    #[async_trait]
    impl FeeProvider for MockFee {
        async fn fee_percent(
            &self,
            _cancel: &CancellationToken,
            _from: &CurrencyCode,
            _to: &CurrencyCode,
        ) -> Result<f64, FeeError> {
            self.0.ok_or_else(|| FeeError::UpstreamStatus {
                status: 500,
                body: "fee service down".into(),
            })
        }
    }

    fn query(from: &str, to: &str, amount: &str) -> ConvertQuery {
        ConvertQuery {
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            amount: Some(amount.to_string()),
        }
    }

    async fn run(
        service: &ConversionService<Arc<MockCache>>,
        q: ConvertQuery,
    ) -> Result<ConvertResponse, AppError> {
        service.convert(&CancellationToken::new(), q).await
    }

    #[tokio::test]
    async fn test_convert_without_fee() {
        let cache = Arc::new(MockCache::new());
        let provider = MockProvider::new(Answer::Rate(5.5));
        let service = ConversionService::new(cache.clone(), provider.clone());

        let response = run(&service, query("usd", "brl", "10000")).await.unwrap();

        assert_eq!(response.from.as_str(), "USD");
        assert_eq!(response.to.as_str(), "BRL");
        assert_eq!(response.amount_cents, 10000);
        assert_eq!(response.result_cents, 55000);
        assert_eq!(response.result, 550.0);
        assert_eq!(response.fee_percent, 0.0);
        assert_eq!(response.fee_amount_cents, 0);
        assert_eq!(response.net_result_cents, 55000);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_fee_is_composed_onto_result() {
        let provider = MockProvider::new(Answer::Rate(5.0325));
        let service = ConversionService::new(Arc::new(MockCache::new()), provider)
            .with_fee_provider(Some(Arc::new(MockFee(Some(0.005)))));

        let response = run(&service, query("USD", "BRL", "10000")).await.unwrap();

        assert_eq!(response.result_cents, 50325);
        assert_eq!(response.fee_amount_cents, 252);
        assert_eq!(response.net_result_cents, 50073);
        assert_eq!(response.net_result, 500.73);
    }

    #[tokio::test]
    async fn test_decimal_amount_is_units() {
        let provider = MockProvider::new(Answer::Rate(2.0));
        let service = ConversionService::new(Arc::new(MockCache::new()), provider);

        let response = run(&service, query("EUR", "USD", "10.50")).await.unwrap();

        assert_eq!(response.amount_cents, 1050);
        assert_eq!(response.result_cents, 2100);
    }

    #[tokio::test]
    async fn test_result_is_cached_with_configured_ttl() {
        let cache = Arc::new(MockCache::new());
        let provider = MockProvider::new(Answer::Rate(5.0));
        let service = ConversionService::new(cache.clone(), provider.clone())
            .with_result_ttl(Duration::from_secs(60));

        let first = run(&service, query("USD", "BRL", "1000")).await.unwrap();
        let second = run(&service, query("usd", "brl", "10.00")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1);
        let (raw, ttl) = cache.entry("convert:USD:BRL:1000").unwrap();
        assert_eq!(ttl, Duration::from_secs(60));
        assert!(raw.contains("\"result_cents\":5000"));
    }

    #[tokio::test]
    async fn test_zero_result_is_not_cached() {
        let cache = Arc::new(MockCache::new());
        let provider = MockProvider::new(Answer::Rate(0.0));
        let service = ConversionService::new(cache.clone(), provider.clone());

        let response = run(&service, query("USD", "BRL", "1000")).await.unwrap();
        assert_eq!(response.result_cents, 0);
        assert_eq!(cache.len(), 0);

        run(&service, query("USD", "BRL", "1000")).await.unwrap();
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_fee_lookup_aborts() {
        let cache = Arc::new(MockCache::new());
        let service = ConversionService::new(cache.clone(), MockProvider::new(Answer::Rate(5.0)))
            .with_fee_provider(Some(Arc::new(MockFee(None))));

        let result = run(&service, query("USD", "BRL", "1000")).await;

        assert!(matches!(result, Err(AppError::BadGateway(_))));
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let provider = MockProvider::new(Answer::Rate(5.0));
        let service = ConversionService::new(Arc::new(MockCache::new()), provider.clone());

        for q in [
            query("", "BRL", "100"),
            query("USD", "BRL", ""),
            query("US", "BRL", "100"),
            query("USD", "BRL", "ten"),
            ConvertQuery::default(),
        ] {
            let result = run(&service, q).await;
            assert!(matches!(result, Err(AppError::BadRequest(_))));
        }
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_errors_map_to_app_errors() {
        let service = ConversionService::new(
            Arc::new(MockCache::new()),
            MockProvider::new(Answer::MissingKey),
        );
        let result = run(&service, query("USD", "BRL", "100")).await;
        assert!(matches!(result, Err(AppError::MissingApiKey(_))));

        let service = ConversionService::new(
            Arc::new(MockCache::new()),
            MockProvider::new(Answer::Unavailable),
        );
        let result = run(&service, query("USD", "BRL", "100")).await;
        assert!(matches!(result, Err(AppError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_out_of_range_result_is_rejected() {
        let cache = Arc::new(MockCache::new());
        let service = ConversionService::new(cache.clone(), MockProvider::new(Answer::Rate(5.0)));

        let amount = i64::MAX.to_string();
        let result = run(&service, query("USD", "BRL", &amount)).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))), "{result:?}");
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_fee_that_overflows_net_amount_is_rejected() {
        let cache = Arc::new(MockCache::new());
        let service = ConversionService::new(cache.clone(), MockProvider::new(Answer::Rate(1.0)))
            .with_fee_provider(Some(Arc::new(MockFee(Some(-1.0)))));

        let result = run(&service, query("USD", "BRL", "6000000000000000000")).await;

        assert!(matches!(result, Err(AppError::BadGateway(_))), "{result:?}");
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_cache_failures_do_not_fail_conversion() {
        let provider = MockProvider::new(Answer::Rate(3.0));
        let service = ConversionService::new(Arc::new(MockCache::failing()), provider.clone());

        let response = run(&service, query("USD", "BRL", "100")).await.unwrap();

        assert_eq!(response.result_cents, 300);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_keeps_default() {
        let service = ConversionService::new(
            Arc::new(MockCache::new()),
            MockProvider::new(Answer::Rate(1.0)),
        )
        .with_result_ttl(Duration::ZERO);

        assert_eq!(service.result_ttl(), crate::service::DEFAULT_RESULT_TTL);
        assert_eq!(service.provider_name(), "mock");
    }
}
