use std::{future::Future, sync::Arc, time::Duration};

use log::{debug, info};
use tokio::{sync::OnceCell, time::Instant};

use crate::{PitwallError, prediction::RawResult};

use super::predictor::{Predictor, PredictorArg};

/// Minimum time between starting a request and reporting its outcome
pub const DEFAULT_MIN_DURATION_MS: u64 = 1500;
/// Upper bound for a single module call
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 120_000;

#[derive(Clone, Debug, PartialEq)]
pub struct InvokerConfig {
    pub min_duration: Duration,
    pub call_timeout: Duration,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            min_duration: Duration::from_millis(DEFAULT_MIN_DURATION_MS),
            call_timeout: Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS),
        }
    }
}

/// Runs prediction module calls on the blocking pool.
///
/// The predictor runtime is started lazily, exactly once, before the first call. Concurrent
/// first callers wait on the same start. A failed start is not remembered, so the next call
/// tries again.
pub struct SimulationInvoker {
    predictor: Arc<dyn Predictor>,
    runtime_ready: OnceCell<()>,
    config: InvokerConfig,
}

impl SimulationInvoker {
    pub fn new(predictor: Arc<dyn Predictor>, config: InvokerConfig) -> Self {
        Self {
            predictor,
            runtime_ready: OnceCell::new(),
            config,
        }
    }

    pub fn config(&self) -> &InvokerConfig {
        &self.config
    }

    pub async fn ensure_started(&self) -> Result<(), PitwallError> {
        self.runtime_ready
            .get_or_try_init(|| async {
                info!("Starting prediction runtime");
                let predictor = Arc::clone(&self.predictor);
                match tokio::task::spawn_blocking(move || predictor.start()).await {
                    Ok(started) => started,
                    Err(e) => Err(PitwallError::RuntimeInit {
                        reason: format!("runtime start did not complete: {}", e),
                    }),
                }
            })
            .await
            .map(|_| ())
    }

    /// Call a module function and split its output into rows, without pacing.
    ///
    /// # Errors
    ///
    /// `RuntimeInit` if the runtime cannot start, `InvocationTimeout` if the call outlives
    /// the configured timeout, `Invocation` if the call fails or its output is unreadable.
    pub async fn call(
        &self,
        module: &str,
        function: &str,
        args: Vec<PredictorArg>,
    ) -> Result<RawResult, PitwallError> {
        self.ensure_started().await?;

        let started = Instant::now();
        let predictor = Arc::clone(&self.predictor);
        let (module_name, function_name) = (module.to_string(), function.to_string());
        let call = tokio::task::spawn_blocking(move || {
            predictor.call(&module_name, &function_name, &args)
        });

        // On timeout the blocking call is left to finish on its own and its output dropped
        let text = match tokio::time::timeout(self.config.call_timeout, call).await {
            Err(_) => {
                return Err(PitwallError::InvocationTimeout {
                    module: module.to_string(),
                    timeout_ms: self.config.call_timeout.as_millis() as u64,
                });
            }
            Ok(Err(e)) => {
                return Err(PitwallError::Invocation {
                    module: module.to_string(),
                    reason: format!("call did not complete: {}", e),
                });
            }
            Ok(Ok(result)) => result?,
        };
        debug!(
            "{}.{} answered in {}ms ({} bytes)",
            module,
            function,
            started.elapsed().as_millis(),
            text.len()
        );

        RawResult::parse(&text).map_err(|e| PitwallError::Invocation {
            module: module.to_string(),
            reason: format!("unreadable output: {}", e),
        })
    }

    /// [`call`](Self::call) held to the configured minimum duration
    pub async fn invoke(
        &self,
        module: &str,
        function: &str,
        args: Vec<PredictorArg>,
    ) -> Result<RawResult, PitwallError> {
        paced(self.config.min_duration, self.call(module, function, args)).await
    }
}

/// Await `work`, then sleep out whatever is left of `floor`. Work slower than the floor
/// is not delayed further.
pub async fn paced<F: Future>(floor: Duration, work: F) -> F::Output {
    let started = Instant::now();
    let output = work.await;
    let elapsed = started.elapsed();
    if elapsed < floor {
        tokio::time::sleep(floor - elapsed).await;
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::predictor::MockPredictor;

    fn invoker(predictor: Arc<MockPredictor>, min_ms: u64, timeout_ms: u64) -> SimulationInvoker {
        SimulationInvoker::new(
            predictor,
            InvokerConfig {
                min_duration: Duration::from_millis(min_ms),
                call_timeout: Duration::from_millis(timeout_ms),
            },
        )
    }

    fn echo_predictor() -> MockPredictor {
        MockPredictor::new().respond("qualifying", |args| Ok(format!("track\n{}\n", args[0])))
    }

    #[tokio::test]
    async fn test_fast_call_is_held_to_floor() {
        let invoker = invoker(Arc::new(echo_predictor()), 200, 5_000);
        let started = std::time::Instant::now();
        let raw = invoker
            .invoke("qualifying", "main", vec![PredictorArg::Int(5)])
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(raw.data_rows(), &[vec!["5".to_string()]]);
    }

    #[tokio::test]
    async fn test_slow_call_gets_no_extra_delay() {
        let predictor = echo_predictor().with_call_delay(Duration::from_millis(400));
        let invoker = invoker(Arc::new(predictor), 250, 5_000);
        let started = std::time::Instant::now();
        invoker
            .invoke("qualifying", "main", vec![PredictorArg::Int(1)])
            .await
            .unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(400));
        assert!(elapsed < Duration::from_millis(600), "took {:?}", elapsed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_runtime_starts_once_under_concurrent_first_use() {
        let predictor = Arc::new(echo_predictor().with_start_delay(Duration::from_millis(50)));
        let invoker = Arc::new(invoker(Arc::clone(&predictor), 0, 5_000));

        let calls = (0..8).map(|i| {
            let invoker = Arc::clone(&invoker);
            tokio::spawn(async move {
                invoker
                    .call("qualifying", "main", vec![PredictorArg::Int(i)])
                    .await
            })
        });
        for result in futures::future::join_all(calls).await {
            assert!(result.unwrap().is_ok());
        }
        assert_eq!(predictor.starts(), 1);
        assert_eq!(predictor.calls(), 8);
    }

    #[tokio::test]
    async fn test_failed_start_is_retried_on_next_call() {
        let predictor = Arc::new(echo_predictor().failing_start("libpython not found"));
        let invoker = invoker(Arc::clone(&predictor), 0, 5_000);

        for _ in 0..2 {
            match invoker.call("qualifying", "main", vec![]).await {
                Err(PitwallError::RuntimeInit { reason }) => assert_eq!(reason, "libpython not found"),
                other => panic!("expected RuntimeInit, got {:?}", other),
            }
        }
        assert_eq!(predictor.starts(), 2);
        assert_eq!(predictor.calls(), 0);
    }

    #[tokio::test]
    async fn test_call_timeout() {
        let predictor = echo_predictor().with_call_delay(Duration::from_millis(300));
        let invoker = invoker(Arc::new(predictor), 0, 50);
        match invoker.call("qualifying", "main", vec![]).await {
            Err(PitwallError::InvocationTimeout { module, timeout_ms }) => {
                assert_eq!(module, "qualifying");
                assert_eq!(timeout_ms, 50);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_module_error_surfaces_immediately() {
        let predictor = MockPredictor::new().respond("strategy", |_| Err("KeyError: 25".to_string()));
        let predictor = Arc::new(predictor);
        let invoker = invoker(Arc::clone(&predictor), 0, 5_000);
        assert!(matches!(
            invoker.call("strategy", "main", vec![]).await,
            Err(PitwallError::Invocation { .. })
        ));
        // no retries
        assert_eq!(predictor.calls(), 1);
    }
}
