//! In-process window function semantics.
//!
//! Every function takes one partition whose rows are already in window
//! order and returns one value per row, matching standard SQL.

/// Split rows into runs of equal partition key. Rows must already be
/// grouped by that key.
pub fn partitions<T, K: PartialEq>(rows: &[T], key: impl Fn(&T) -> K) -> Vec<&[T]> {
    rows.chunk_by(|a, b| key(a) == key(b)).collect()
}

/// `ROW_NUMBER()`
pub fn row_number(len: usize) -> Vec<i64> {
    (1..=len as i64).collect()
}

/// `RANK()`: peers share the rank of their first row, leaving gaps after
pub fn rank<T: PartialEq>(keys: &[T]) -> Vec<i64> {
    let mut ranks = Vec::with_capacity(keys.len());
    for (i, key) in keys.iter().enumerate() {
        if i > 0 && keys[i - 1] == *key {
            ranks.push(ranks[i - 1]);
        } else {
            ranks.push(i as i64 + 1);
        }
    }
    ranks
}

/// `DENSE_RANK()`: peers share a rank, no gaps
pub fn dense_rank<T: PartialEq>(keys: &[T]) -> Vec<i64> {
    let mut ranks = Vec::with_capacity(keys.len());
    let mut current = 0;
    for (i, key) in keys.iter().enumerate() {
        if i == 0 || keys[i - 1] != *key {
            current += 1;
        }
        ranks.push(current);
    }
    ranks
}

/// `PERCENT_RANK()`: `(rank - 1) / (rows - 1)`, 0 for a single row
pub fn percent_rank<T: PartialEq>(keys: &[T]) -> Vec<f64> {
    if keys.len() <= 1 {
        return vec![0.0; keys.len()];
    }
    let denominator = (keys.len() - 1) as f64;
    rank(keys)
        .into_iter()
        .map(|r| (r - 1) as f64 / denominator)
        .collect()
}

/// `CUME_DIST()`: fraction of rows ordered at or before the current row's
/// last peer
pub fn cume_dist<T: PartialEq>(keys: &[T]) -> Vec<f64> {
    let n = keys.len() as f64;
    let mut result = vec![0.0; keys.len()];
    let mut start = 0;
    while start < keys.len() {
        let mut end = start + 1;
        while end < keys.len() && keys[end] == keys[start] {
            end += 1;
        }
        let value = end as f64 / n;
        result[start..end].fill(value);
        start = end;
    }
    result
}

/// `NTILE(buckets)`: sizes differ by at most one, larger buckets first
pub fn ntile(len: usize, buckets: usize) -> Vec<i64> {
    if buckets == 0 {
        return vec![];
    }
    let base = len / buckets;
    let remainder = len % buckets;
    let mut result = Vec::with_capacity(len);
    for bucket in 0..buckets {
        let size = base + usize::from(bucket < remainder);
        result.extend(std::iter::repeat_n(bucket as i64 + 1, size));
    }
    result
}

/// `SUM(x) OVER (ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)`
pub fn running_total(values: &[i64]) -> Vec<i64> {
    values
        .iter()
        .scan(0, |total, value| {
            *total += value;
            Some(*total)
        })
        .collect()
}

/// `AVG(x) OVER (ROWS BETWEEN radius PRECEDING AND radius FOLLOWING)`
pub fn centered_moving_average(values: &[f64], radius: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius).min(values.len() - 1);
            let frame = &values[lo..=hi];
            frame.iter().sum::<f64>() / frame.len() as f64
        })
        .collect()
}

/// `LAG(x, offset)`
pub fn lag<T: Clone>(values: &[T], offset: usize) -> Vec<Option<T>> {
    (0..values.len())
        .map(|i| i.checked_sub(offset).map(|j| values[j].clone()))
        .collect()
}

/// `LEAD(x, offset)`
pub fn lead<T: Clone>(values: &[T], offset: usize) -> Vec<Option<T>> {
    (0..values.len())
        .map(|i| values.get(i + offset).cloned())
        .collect()
}
