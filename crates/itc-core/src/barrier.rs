use std::future::Future;

use tokio::task::JoinSet;

use crate::error::{PipelineError, Stage};

/// N result slots plus a fill counter.
///
/// Each result lands in the slot reserved for its index, so the final order
/// depends only on the input order, never on completion order.
///
/// # Example
/// ```
/// use itc_core::barrier::IndexedSlots;
/// let mut slots = IndexedSlots::new(2);
/// assert!(!slots.fill(1, "b"));
/// assert!(slots.fill(0, "a"));
/// assert_eq!(slots.into_ordered(), Some(vec!["a", "b"]));
/// ```
#[derive(Debug)]
pub struct IndexedSlots<T> {
    slots: Vec<Option<T>>,
    filled: usize,
}

impl<T> IndexedSlots<T> {
    /// Reserve `len` empty slots.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(len).collect(),
            filled: 0,
        }
    }

    /// Store `value` in slot `index`. Returns `true` once every slot is filled.
    ///
    /// Out-of-range indices and refills of an occupied slot are ignored.
    pub fn fill(&mut self, index: usize, value: T) -> bool {
        if let Some(slot) = self.slots.get_mut(index)
            && slot.is_none()
        {
            *slot = Some(value);
            self.filled += 1;
        }
        self.is_complete()
    }

    /// Number of filled slots.
    #[must_use]
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// `true` when every slot holds a value.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.filled == self.slots.len()
    }

    /// Values in slot order, or `None` if a slot is still empty.
    #[must_use]
    pub fn into_ordered(self) -> Option<Vec<T>> {
        self.slots.into_iter().collect()
    }
}

/// Lance `op` sur chaque item, puis attend la barrière indexée.
///
/// Every per-item future is spawned before any completion is awaited. The
/// call resolves with all results in input order, or with the first error.
/// On failure the remaining tasks are detached: they run to completion but
/// nothing observes their results.
///
/// Must be called from within a tokio runtime.
pub async fn fan_out<I, T, F, Fut>(
    stage: Stage,
    items: Vec<I>,
    mut op: F,
) -> Result<Vec<T>, PipelineError>
where
    F: FnMut(usize, I) -> Fut,
    Fut: Future<Output = Result<T, PipelineError>> + Send + 'static,
    T: Send + 'static,
{
    let mut slots = IndexedSlots::new(items.len());
    let mut tasks = JoinSet::new();
    for (index, item) in items.into_iter().enumerate() {
        let fut = op(index, item);
        tasks.spawn(async move { (index, fut.await) });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(value))) => {
                if slots.fill(index, value) {
                    break;
                }
            }
            Ok((index, Err(err))) => {
                log::debug!("{stage}: item {index} failed, {} task(s) left", tasks.len());
                tasks.detach_all();
                return Err(err);
            }
            Err(join) => {
                tasks.detach_all();
                return Err(PipelineError::Aborted {
                    stage,
                    reason: join.to_string(),
                });
            }
        }
    }

    let filled = slots.filled();
    slots.into_ordered().ok_or_else(|| PipelineError::Aborted {
        stage,
        reason: format!("barrier closed with {filled} result(s) missing"),
    })
}
