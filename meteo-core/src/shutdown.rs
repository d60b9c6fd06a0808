use tokio_util::sync::CancellationToken;

/// Cooperative, one-way shutdown flag shared by the scheduler and the control
/// loop. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to the raised state. Raising again is a no-op.
    pub fn raise(&self) {
        self.token.cancel();
    }

    pub fn is_raised(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal has been raised, immediately if it already was.
    pub async fn raised(&self) {
        self.token.cancelled().await
    }
}
