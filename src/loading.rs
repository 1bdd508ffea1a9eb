use crate::surface::Surface;
use std::sync::{Arc, Mutex, PoisonError};

/// Shared loading indicator counting outstanding operations. It is shown
/// when the count leaves zero and hidden when it returns to zero.
pub struct LoadingIndicator {
    outstanding: Mutex<usize>,
    surface: Arc<dyn Surface>,
}

impl LoadingIndicator {
    pub fn new(surface: Arc<dyn Surface>) -> Arc<Self> {
        Arc::new(Self {
            outstanding: Mutex::new(0),
            surface,
        })
    }

    /// Registers one outstanding operation until the guard is dropped.
    pub fn acquire(self: &Arc<Self>) -> LoadingGuard {
        let mut outstanding = self.outstanding.lock().unwrap_or_else(PoisonError::into_inner);
        *outstanding += 1;
        if *outstanding == 1 {
            self.surface.show_loading();
        }
        LoadingGuard {
            indicator: Arc::clone(self),
        }
    }

    pub fn outstanding(&self) -> usize {
        *self.outstanding.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self) {
        let mut outstanding = self.outstanding.lock().unwrap_or_else(PoisonError::into_inner);
        *outstanding = outstanding.saturating_sub(1);
        if *outstanding == 0 {
            self.surface.hide_loading();
        }
    }
}

/// Releases its slot on drop, including when the owning future is dropped
/// mid-request.
#[must_use = "the indicator is released as soon as the guard is dropped"]
pub struct LoadingGuard {
    indicator: Arc<LoadingIndicator>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.indicator.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{RecordingSurface, SurfaceEvent};

    fn indicator() -> (Arc<RecordingSurface>, Arc<LoadingIndicator>) {
        let surface = Arc::new(RecordingSurface::new());
        let indicator = LoadingIndicator::new(surface.clone());
        (surface, indicator)
    }

    #[test]
    fn overlapping_guards_toggle_once() {
        let (surface, indicator) = indicator();

        let first = indicator.acquire();
        let second = indicator.acquire();
        assert_eq!(indicator.outstanding(), 2);

        drop(first);
        assert!(surface.loading_visible());

        drop(second);
        assert!(!surface.loading_visible());
        assert_eq!(
            surface.events(),
            vec![SurfaceEvent::LoadingShown, SurfaceEvent::LoadingHidden]
        );
    }

    #[test]
    fn guard_released_when_future_is_cancelled() {
        let (surface, indicator) = indicator();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        runtime.block_on(async {
            let pending = {
                let indicator = Arc::clone(&indicator);
                async move {
                    let _guard = indicator.acquire();
                    std::future::pending::<()>().await;
                }
            };
            let result =
                tokio::time::timeout(std::time::Duration::from_millis(10), pending).await;
            assert!(result.is_err());
        });

        assert_eq!(indicator.outstanding(), 0);
        assert!(!surface.loading_visible());
    }
}
