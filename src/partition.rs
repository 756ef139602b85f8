use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Result;
use crate::query::{SearchQuery, StarRange};

/// The platform returns at most this many results per query, however deep
/// the pagination goes.
pub const RESULT_CAP: u64 = 1000;

/// Cardinality seam: how many repositories match a query. Implemented by the
/// live client and by in-memory datasets in tests.
#[async_trait]
pub trait RepoCounter {
    async fn count(&mut self, query: &SearchQuery) -> Result<u64>;
}

/// Result-space geometry derived from one exploratory query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBounds {
    pub total_results: u64,
    pub max_stars: u64,
    pub buckets: u64,
    pub min_bucket_size: u64,
    pub max_bucket_size: u64,
}

impl SearchBounds {
    pub fn derive(total_results: u64, max_stars: u64, max_bucket_size: u64) -> Self {
        let buckets = total_results.div_ceil(max_bucket_size).max(1);
        let min_bucket_size = total_results.div_ceil(buckets);
        SearchBounds {
            total_results,
            max_stars,
            buckets,
            min_bucket_size,
            max_bucket_size,
        }
    }
}

/// Split the star axis into contiguous half-open ranges `[d[i], d[i+1])`
/// whose result counts land in `[min_bucket_size, max_bucket_size]`, except
/// for two accepted fixed points: an undersized bucket when growth and
/// bisection converge without reaching the minimum, and an oversized bucket
/// when a single star value alone exceeds the maximum (splitting that one is
/// deferred to the collection phase's overflow cursor).
///
/// The returned sequence is strictly increasing, starts at 0, and ends at
/// `max_stars + 1`.
pub async fn compute_delimiters<C: RepoCounter>(
    counter: &mut C,
    bounds: &SearchBounds,
    base: &SearchQuery,
) -> Result<Vec<u64>> {
    let mut delimiters = vec![0u64];
    let mut from = 0u64;
    let mut remaining = bounds.total_results;
    let mut bucket_estimate = bounds.buckets;

    while remaining > bounds.max_bucket_size && from <= bounds.max_stars {
        let (to, count) =
            resolve_bucket_end(counter, bounds, base, from, &mut bucket_estimate).await?;
        delimiters.push(to + 1);
        remaining = remaining.saturating_sub(count);
        from = to + 1;
    }

    if *delimiters.last().unwrap_or(&0) <= bounds.max_stars {
        delimiters.push(bounds.max_stars + 1);
    }

    info!(
        "bucket delimiters: {:?} ({} ranges, {} estimated buckets)",
        delimiters,
        delimiters.len() - 1,
        bucket_estimate
    );
    Ok(delimiters)
}

/// Find the smallest `to >= from` whose inclusive count fits the bucket
/// bounds: double the window until something overshoots, then bisect.
async fn resolve_bucket_end<C: RepoCounter>(
    counter: &mut C,
    bounds: &SearchBounds,
    base: &SearchQuery,
    from: u64,
    bucket_estimate: &mut u64,
) -> Result<(u64, u64)> {
    let mut to = from;
    // Highest end value known to give an undersized count, and that count.
    let mut lower = from;
    let mut lower_count: Option<u64> = None;
    // Lowest end value known to give an oversized count, once one exists.
    let mut upper = bounds.max_stars;
    let mut overshot = false;

    loop {
        let count = counter
            .count(&base.with_stars(StarRange::new(from, to)))
            .await?;
        info!("probed stars {from}..{to}: {count} results");

        if (bounds.min_bucket_size..=bounds.max_bucket_size).contains(&count) {
            return Ok((to, count));
        }

        if count > bounds.max_bucket_size {
            if to == from {
                warn!(
                    "star value {from} alone holds {count} repositories, \
                     accepting oversized bucket for the collection overflow path"
                );
                return Ok((to, count));
            }
            overshot = true;
            upper = to;
            let next = lower + (to - lower) / 2;
            if next == lower {
                if let Some(accepted) = lower_count {
                    warn!(
                        "no boundary between stars {lower} and {to} fits, \
                         accepting undersized bucket {from}..{lower} ({accepted} results)"
                    );
                    *bucket_estimate += 1;
                    return Ok((lower, accepted));
                }
                // `lower == from` was the first probe and was not oversized,
                // so this arm is unreachable; accept the oversize to be safe.
                return Ok((to, count));
            }
            to = next;
        } else {
            lower = to;
            lower_count = Some(count);
            let next = if overshot {
                to + (upper - to).div_ceil(2)
            } else if to == 0 {
                1
            } else {
                to.saturating_mul(2).min(bounds.max_stars)
            };
            if (overshot && next >= upper) || next == to {
                warn!(
                    "growth converged at stars {from}..{to} with only {count} results, \
                     accepting undersized bucket"
                );
                *bucket_estimate += 1;
                return Ok((to, count));
            }
            to = next;
        }
    }
}
