//! Backend selection: construct and probe the preferred backend once per
//! process, falling back to the offline mock when it is unusable.

use std::fmt;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::backend::{BackendFactory, DefaultFactory, Stylist};
use crate::config::{BackendKind, Config};
use crate::error::GarbError;
use crate::probe;

/// The adapter a process settled on.
#[derive(Clone)]
pub struct Selected {
    pub kind: BackendKind,
    pub stylist: Arc<dyn Stylist>,
}

impl fmt::Debug for Selected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selected")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Picks a backend on first use and caches it for the process lifetime.
///
/// The cached selection is written exactly once. Concurrent first callers
/// share a single initialization: the cell admits one initializer at a
/// time, so probing never runs in parallel with itself. Later operation
/// failures on the selected backend surface as ordinary errors and never
/// trigger re-selection.
pub struct Selector {
    config: Config,
    factory: Box<dyn BackendFactory>,
    selected: OnceCell<Selected>,
}

impl Selector {
    pub fn new(config: Config) -> Self {
        Self::with_factory(config, Box::new(DefaultFactory))
    }

    /// Swap the adapter factory. Tests use this to count constructions
    /// and to substitute stubs for the real backends.
    pub fn with_factory(config: Config, factory: Box<dyn BackendFactory>) -> Self {
        Self {
            config,
            factory,
            selected: OnceCell::new(),
        }
    }

    /// The selected backend, initializing on first call.
    ///
    /// Probe failures on the preferred backend are absorbed here; the only
    /// error that escapes is a failure to build the mock itself, which has
    /// no further fallback.
    pub async fn select(&self) -> Result<Selected, GarbError> {
        self.selected
            .get_or_try_init(|| self.select_once())
            .await
            .cloned()
    }

    /// Cached selection, if initialization has already completed.
    pub fn current(&self) -> Option<&Selected> {
        self.selected.get()
    }

    async fn select_once(&self) -> Result<Selected, GarbError> {
        let preferred = self.config.preferred;

        if preferred != BackendKind::Mock {
            match self.factory.build(preferred, &self.config) {
                Ok(stylist) => {
                    if probe::is_usable(stylist.as_ref()).await {
                        tracing::info!(backend = preferred.as_str(), "backend selected");
                        return Ok(Selected {
                            kind: preferred,
                            stylist,
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        backend = preferred.as_str(),
                        "cannot construct preferred backend: {e}"
                    );
                }
            }
            tracing::info!("falling back to the offline mock backend");
        }

        let stylist = self.factory.build(BackendKind::Mock, &self.config)?;
        Ok(Selected {
            kind: BackendKind::Mock,
            stylist,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockStylist;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts constructions; optionally refuses to build non-mock kinds.
    struct CountingFactory {
        built: Arc<AtomicUsize>,
        fail_preferred: bool,
    }

    impl BackendFactory for CountingFactory {
        fn build(
            &self,
            kind: BackendKind,
            _config: &Config,
        ) -> Result<Arc<dyn Stylist>, GarbError> {
            self.built.fetch_add(1, Ordering::SeqCst);
            if self.fail_preferred && kind != BackendKind::Mock {
                return Err(GarbError::Configuration {
                    message: "no credentials".to_string(),
                });
            }
            Ok(Arc::new(MockStylist::with_delay(Duration::ZERO)))
        }
    }

    fn prefer(kind: BackendKind) -> Config {
        Config {
            preferred: kind,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn preferred_mock_skips_probing() {
        let built = Arc::new(AtomicUsize::new(0));
        let selector = Selector::with_factory(
            prefer(BackendKind::Mock),
            Box::new(CountingFactory {
                built: built.clone(),
                fail_preferred: false,
            }),
        );
        let selected = selector.select().await.unwrap();
        assert_eq!(selected.kind, BackendKind::Mock);
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn construction_failure_falls_back_to_mock() {
        let built = Arc::new(AtomicUsize::new(0));
        let selector = Selector::with_factory(
            prefer(BackendKind::Direct),
            Box::new(CountingFactory {
                built: built.clone(),
                fail_preferred: true,
            }),
        );
        let selected = selector.select().await.unwrap();
        assert_eq!(selected.kind, BackendKind::Mock);
        // one failed direct build plus the mock build
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn selection_is_cached_across_calls() {
        let built = Arc::new(AtomicUsize::new(0));
        let selector = Selector::with_factory(
            prefer(BackendKind::Mock),
            Box::new(CountingFactory {
                built: built.clone(),
                fail_preferred: false,
            }),
        );
        let first = selector.select().await.unwrap();
        let second = selector.select().await.unwrap();
        assert!(Arc::ptr_eq(&first.stylist, &second.stylist));
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert!(selector.current().is_some());
    }

    #[tokio::test]
    async fn missing_direct_credentials_fall_back_with_real_factory() {
        // Default config has no API key, so the direct build fails before
        // any network is touched.
        let selector = Selector::new(prefer(BackendKind::Direct));
        let selected = selector.select().await.unwrap();
        assert_eq!(selected.kind, BackendKind::Mock);
        assert_eq!(selected.stylist.name(), "mock");
    }
}
