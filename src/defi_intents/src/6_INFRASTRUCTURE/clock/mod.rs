//! Time source for deadlines, quote staleness and confirmation timeouts

use futures::channel::oneshot;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync {
    /// Unix time in seconds
    fn now_secs(&self) -> u64;

    /// Resolves after `duration`
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Wall clock
///
/// Sleeps use the tokio timer when called inside a tokio runtime. Hosts on
/// any other executor get a parked timer thread per sleep instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return tokio::time::sleep(duration).boxed();
        }

        let (done, fired) = oneshot::channel();
        thread::spawn(move || {
            thread::sleep(duration);
            let _ = done.send(());
        });
        fired.map(|_| ()).boxed()
    }
}
