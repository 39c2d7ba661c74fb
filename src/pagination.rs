//! Infinite-scroll bookkeeping.
//!
//! [`EndlessScroll`] watches scroll updates of a growing list and decides
//! when the next page should be requested. It keeps three pieces of state:
//! whether a load is in flight, the last page known to be loaded, and the
//! item count seen when that load completed.
//!
//! ```text
//!            on_load_more(..) == true
//!   idle ─────────────────────────────▶ loading
//!    ▲                                    │
//!    └──────── total item count grew ─────┘   (current_page += 1)
//! ```
//!
//! Every update is gated on a synchronous [`Connectivity`] check; while
//! offline the state machine is frozen so no page number is consumed by a
//! request that cannot succeed.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task;
use tracing::{debug, warn};

/// Items left below the viewport before the next page is requested.
pub const DEFAULT_VISIBLE_THRESHOLD: usize = 5;

/// Answers "is the network reachable right now?".
pub trait Connectivity {
    fn is_connected(&self) -> bool;
}

impl<F> Connectivity for F
where
    F: Fn() -> bool,
{
    fn is_connected(&self) -> bool {
        self()
    }
}

/// Reachability check that opens (and drops) a TCP connection to a host.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    /// Probe the host and port of `url` (defaulting to the scheme's port).
    pub fn for_url(url: &url::Url, timeout: Duration) -> Option<Self> {
        let host = url.host_str()?;
        let port = url.port_or_known_default()?;
        Some(Self::new(host, port, timeout))
    }

    fn probe(&self) -> bool {
        let addrs = match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                warn!(host = %self.host, error = %e, "Could not resolve host");
                return false;
            }
        };
        for addr in addrs {
            if TcpStream::connect_timeout(&addr, self.timeout).is_ok() {
                return true;
            }
        }
        warn!(host = %self.host, port = self.port, "No network connection");
        false
    }
}

impl Connectivity for TcpProbe {
    /// Blocks for the DNS lookup and connect. On a multi-threaded runtime the
    /// worker is handed over with `block_in_place` first; `block_in_place`
    /// panics on a current-thread runtime, so there the probe runs inline.
    fn is_connected(&self) -> bool {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                task::block_in_place(|| self.probe())
            }
            _ => self.probe(),
        }
    }
}

/// Scroll listener state machine.
#[derive(Debug, Clone)]
pub struct EndlessScroll<C> {
    connectivity: C,
    visible_threshold: usize,
    current_page: u32,
    previous_total: usize,
    loading: bool,
    starting_page: u32,
}

impl<C> EndlessScroll<C>
where
    C: Connectivity,
{
    /// A listener starting from page 0 with the default threshold.
    ///
    /// The first load is expected to be issued by the caller; `loading`
    /// starts out `true` so the first batch of items completes it.
    pub fn new(connectivity: C) -> Self {
        Self::starting_at(connectivity, 0, DEFAULT_VISIBLE_THRESHOLD)
    }

    /// A listener whose page counter begins at `starting_page`.
    pub fn starting_at(connectivity: C, starting_page: u32, visible_threshold: usize) -> Self {
        Self {
            connectivity,
            visible_threshold,
            current_page: starting_page,
            previous_total: 0,
            loading: true,
            starting_page,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn previous_total(&self) -> usize {
        self.previous_total
    }

    /// Feed one scroll position update.
    ///
    /// `on_load_more(page, total)` is invoked when the viewport is within the
    /// threshold of the list end and no load is pending. It must return
    /// `true` if it actually started loading `page`.
    ///
    /// Returns `false` when the update was ignored because the network is
    /// unreachable.
    pub fn on_scroll<F>(
        &mut self,
        first_visible: usize,
        visible_count: usize,
        total: usize,
        on_load_more: F,
    ) -> bool
    where
        F: FnOnce(u32, usize) -> bool,
    {
        if !self.connectivity.is_connected() {
            debug!("Offline; scroll update ignored");
            return false;
        }

        if total < self.previous_total {
            debug!(total, previous = self.previous_total, "List shrank; resetting pagination");
            self.current_page = self.starting_page;
            self.previous_total = total;
            self.loading = true;
        }

        if self.loading && total > self.previous_total {
            self.loading = false;
            self.previous_total = total;
            self.current_page += 1;
            debug!(page = self.current_page, total, "Page load completed");
        }

        if !self.loading && first_visible + visible_count + self.visible_threshold >= total {
            let next = self.current_page + 1;
            self.loading = on_load_more(next, total);
            debug!(page = next, loading = self.loading, "Requested more items");
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn online() -> impl Fn() -> bool {
        || true
    }

    #[test]
    fn test_initial_state() {
        let scroll = EndlessScroll::new(online());
        assert_eq!(scroll.current_page(), 0);
        assert!(scroll.is_loading());
        assert_eq!(scroll.previous_total(), 0);
    }

    #[test]
    fn test_first_batch_completes_initial_load() {
        let mut scroll = EndlessScroll::new(online());
        let mut requested = None;
        // 20 items, viewport at the top: far from the end
        scroll.on_scroll(0, 5, 20, |page, _| {
            requested = Some(page);
            true
        });
        assert_eq!(scroll.current_page(), 1);
        assert!(!scroll.is_loading());
        assert_eq!(requested, None);
    }

    #[test]
    fn test_threshold_triggers_next_page() {
        let mut scroll = EndlessScroll::new(online());
        scroll.on_scroll(0, 5, 20, |_, _| unreachable!());

        // 9 + 5 + 5 = 19 < 20: not yet
        scroll.on_scroll(9, 5, 20, |_, _| panic!("too early"));
        assert!(!scroll.is_loading());

        let mut requested = None;
        scroll.on_scroll(10, 5, 20, |page, total| {
            requested = Some((page, total));
            true
        });
        assert_eq!(requested, Some((2, 20)));
        assert!(scroll.is_loading());
    }

    #[test]
    fn test_pending_load_blocks_further_requests() {
        let mut scroll = EndlessScroll::new(online());
        scroll.on_scroll(0, 5, 20, |_, _| true);
        scroll.on_scroll(15, 5, 20, |_, _| true);
        assert!(scroll.is_loading());

        let calls = Cell::new(0);
        for _ in 0..3 {
            scroll.on_scroll(15, 5, 20, |_, _| {
                calls.set(calls.get() + 1);
                true
            });
        }
        assert_eq!(calls.get(), 0);
        assert_eq!(scroll.current_page(), 1);
    }

    #[test]
    fn test_callback_false_keeps_idle() {
        let mut scroll = EndlessScroll::new(online());
        scroll.on_scroll(0, 5, 20, |_, _| false);
        let calls = Cell::new(0);
        for _ in 0..2 {
            scroll.on_scroll(18, 2, 20, |_, _| {
                calls.set(calls.get() + 1);
                false
            });
        }
        assert_eq!(calls.get(), 2);
        assert!(!scroll.is_loading());
        assert_eq!(scroll.current_page(), 1);
    }

    #[test]
    fn test_monotonic_totals_advance_once_per_completion() {
        let mut scroll = EndlessScroll::new(online());
        let mut requests = Vec::new();
        let mut total = 0;

        for batch in 1..=6u32 {
            total += 20;
            // several updates per batch; only the first sees the growth
            for first_visible in [total - 20, total - 12, total - 10] {
                scroll.on_scroll(first_visible, 5, total, |page, _| {
                    requests.push(page);
                    true
                });
            }
            assert_eq!(scroll.current_page(), batch);
        }
        assert_eq!(requests, vec![2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_shrinking_list_resets_to_start() {
        let mut scroll = EndlessScroll::starting_at(online(), 0, 5);
        scroll.on_scroll(0, 5, 20, |_, _| true);
        scroll.on_scroll(15, 5, 20, |_, _| true);
        scroll.on_scroll(15, 5, 40, |_, _| true);
        assert_eq!(scroll.current_page(), 2);

        scroll.on_scroll(0, 0, 0, |_, _| panic!("no load while re-armed"));
        assert_eq!(scroll.current_page(), 0);
        assert!(scroll.is_loading());
        assert_eq!(scroll.previous_total(), 0);

        scroll.on_scroll(0, 5, 20, |_, _| true);
        assert_eq!(scroll.current_page(), 1);
    }

    #[test]
    fn test_shrink_to_non_zero_rearms_loading() {
        let mut scroll = EndlessScroll::new(online());
        scroll.on_scroll(0, 5, 40, |_, _| false);
        scroll.on_scroll(0, 5, 10, |_, _| panic!("loading is re-armed"));
        assert!(scroll.is_loading());
        assert_eq!(scroll.previous_total(), 10);
        assert_eq!(scroll.current_page(), 0);
    }

    #[test]
    fn test_offline_freezes_state() {
        let online_flag = Cell::new(false);
        let mut scroll = EndlessScroll::new(|| online_flag.get());

        assert!(!scroll.on_scroll(0, 5, 20, |_, _| panic!("offline")));
        assert_eq!(scroll.current_page(), 0);
        assert!(scroll.is_loading());
        assert_eq!(scroll.previous_total(), 0);

        online_flag.set(true);
        assert!(scroll.on_scroll(0, 5, 20, |_, _| true));
        assert_eq!(scroll.current_page(), 1);
    }

    #[test]
    fn test_restored_listener_resumes_page() {
        // saved session had loaded pages 1..=3 (60 items)
        let mut scroll = EndlessScroll::starting_at(online(), 2, 5);
        let mut requested = None;
        scroll.on_scroll(50, 5, 60, |page, _| {
            requested = Some(page);
            true
        });
        assert_eq!(scroll.current_page(), 3);
        assert_eq!(requested, Some(4));
    }

    #[test]
    fn test_tcp_probe_for_url() {
        let url = url::Url::parse("https://content.guardianapis.com/search").unwrap();
        let probe = TcpProbe::for_url(&url, Duration::from_millis(10)).unwrap();
        assert_eq!(probe.host, "content.guardianapis.com");
        assert_eq!(probe.port, 443);
    }

    #[test]
    fn test_tcp_probe_local_listener() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let probe = TcpProbe::new("127.0.0.1", port, Duration::from_millis(500));
        assert!(probe.is_connected());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_tcp_probe_inside_multi_thread_runtime() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let probe = TcpProbe::new("127.0.0.1", port, Duration::from_millis(500));
        assert!(probe.is_connected());
        drop(listener);
        assert!(!probe.is_connected());
    }

    #[tokio::test]
    async fn test_tcp_probe_inside_current_thread_runtime() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let probe = TcpProbe::new("127.0.0.1", port, Duration::from_millis(500));
        assert!(probe.is_connected());
    }
}
