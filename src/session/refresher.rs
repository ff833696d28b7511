//! Pending metadata refresh operations.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;

use crate::types::RefreshKind;

/// A pending metadata fetch returned alongside an incomplete result.
///
/// Await it, then ask for typeahead again: the refresher settles the
/// session cache (or reports the failure through the error channel) and
/// resolves to nothing either way. There is no resume mechanism back into
/// the request that produced it.
pub struct Refresher {
    kind: RefreshKind,
    future: BoxFuture<'static, ()>,
}

impl Refresher {
    pub(crate) fn new(kind: RefreshKind, future: BoxFuture<'static, ()>) -> Self {
        Self { kind, future }
    }

    /// Which fetch this refresher performs.
    pub fn kind(&self) -> &RefreshKind {
        &self.kind
    }
}

impl fmt::Debug for Refresher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refresher")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Future for Refresher {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.get_mut().future.as_mut().poll(cx)
    }
}
