//! Rebuild callbacks for a pack.
//!
//! The controller never clears anything. A callback is expected to clear the
//! buckets it owns and then repopulate them.

use std::fmt;
use std::sync::Arc;

use rrp_store::BoxError;
use rrp_types::Side;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{PackError, PackResult};

/// A rebuild callback. It receives the pack and a token it should poll.
pub type RegenerationCallback<C: ?Sized> =
    Arc<dyn Fn(&C, &CancellationToken) -> Result<(), BoxError> + Send + Sync>;

/// What a regeneration call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegenerationOutcome {
    pub callbacks_run: usize,
    pub interrupted: bool,
}

/// Holds an optional whole-pack callback and optional per-side callbacks.
pub struct RegenerationController<C: ?Sized> {
    all: Option<RegenerationCallback<C>>,
    client: Option<RegenerationCallback<C>>,
    server: Option<RegenerationCallback<C>>,
}

impl<C: ?Sized> RegenerationController<C> {
    pub fn new() -> Self {
        Self {
            all: None,
            client: None,
            server: None,
        }
    }

    pub fn set_all_callback<F>(&mut self, callback: F)
    where
        F: Fn(&C, &CancellationToken) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.all = Some(Arc::new(callback));
    }

    pub fn set_sided_callback<F>(&mut self, side: Side, callback: F)
    where
        F: Fn(&C, &CancellationToken) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        *self.slot(side) = Some(Arc::new(callback));
    }

    pub fn has_all_callback(&self) -> bool {
        self.all.is_some()
    }

    pub fn has_sided_callback(&self, side: Side) -> bool {
        self.sided(side).is_some()
    }

    /// Run the whole-pack callback, or else every sided callback in
    /// client, server order. Stops before the next callback once `cancel`
    /// fires, and on the first callback error.
    pub fn regenerate_all(
        &self,
        ctx: &C,
        cancel: &CancellationToken,
    ) -> PackResult<RegenerationOutcome> {
        if let Some(callback) = &self.all {
            return run(ctx, cancel, "all", callback);
        }

        let mut outcome = RegenerationOutcome::default();
        for side in Side::ALL {
            let Some(callback) = self.sided(side) else {
                continue;
            };
            if cancel.is_cancelled() {
                warn!(%side, "regeneration interrupted before callback");
                outcome.interrupted = true;
                break;
            }
            let step = run(ctx, cancel, side_scope(side), callback)?;
            outcome.callbacks_run += step.callbacks_run;
            if step.interrupted {
                outcome.interrupted = true;
                break;
            }
        }
        Ok(outcome)
    }

    /// Run only the callback for `side`. Without one this does nothing.
    pub fn regenerate_sided(
        &self,
        side: Side,
        ctx: &C,
        cancel: &CancellationToken,
    ) -> PackResult<RegenerationOutcome> {
        match self.sided(side) {
            Some(callback) => run(ctx, cancel, side_scope(side), callback),
            None => {
                debug!(%side, "no sided regeneration callback");
                Ok(RegenerationOutcome::default())
            }
        }
    }

    fn sided(&self, side: Side) -> Option<&RegenerationCallback<C>> {
        match side {
            Side::Client => self.client.as_ref(),
            Side::Server => self.server.as_ref(),
        }
    }

    fn slot(&mut self, side: Side) -> &mut Option<RegenerationCallback<C>> {
        match side {
            Side::Client => &mut self.client,
            Side::Server => &mut self.server,
        }
    }
}

fn side_scope(side: Side) -> &'static str {
    match side {
        Side::Client => "client",
        Side::Server => "server",
    }
}

fn run<C: ?Sized>(
    ctx: &C,
    cancel: &CancellationToken,
    scope: &'static str,
    callback: &RegenerationCallback<C>,
) -> PackResult<RegenerationOutcome> {
    debug!(scope, "running regeneration callback");
    callback(ctx, cancel).map_err(|source| PackError::Regeneration { scope, source })?;
    let interrupted = cancel.is_cancelled();
    if interrupted {
        warn!(scope, "regeneration interrupted");
    }
    Ok(RegenerationOutcome {
        callbacks_run: 1,
        interrupted,
    })
}

impl<C: ?Sized> Default for RegenerationController<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> Clone for RegenerationController<C> {
    fn clone(&self) -> Self {
        Self {
            all: self.all.clone(),
            client: self.client.clone(),
            server: self.server.clone(),
        }
    }
}

impl<C: ?Sized> fmt::Debug for RegenerationController<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegenerationController")
            .field("all", &self.all.is_some())
            .field("client", &self.client.is_some())
            .field("server", &self.server.is_some())
            .finish()
    }
}
