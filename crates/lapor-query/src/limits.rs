use serde::{Deserialize, Serialize};

/// Operational bounds for one engine instance.
///
/// `max_scan_batches` is the safety valve on the page-assembly loop: a search
/// term matching almost nothing would otherwise walk the whole collection one
/// batch at a time inside a single call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineLimits {
    pub max_page_size: usize,
    /// Raw batch size for page assembly and has-next probing.
    pub scan_batch_size: usize,
    /// Upper bound on fetch iterations within one page assembly or probe.
    pub max_scan_batches: usize,
    /// Raw batch size for the counter's manual scan.
    pub count_batch_size: usize,
    /// Upper bound on fetch iterations within one manual count.
    pub max_count_batches: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_page_size: 500,
            scan_batch_size: 50,
            max_scan_batches: 40,
            count_batch_size: 300,
            max_count_batches: 1_000,
        }
    }
}
