// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fork/join helpers.
//!
//! Every parallel pass in the crate writes a fresh output buffer whose
//! rows are independent of one another, so the output is broken up
//! with `chunks_mut` and each block of rows handed to a scoped thread.
//! Nothing here is unsafe, and nothing outlives the call: the scope
//! joins every worker before returning, and a panicking worker is
//! re-raised on the caller's thread.
//!
//! Without the `threaded` feature both helpers run inline.

/// Call `f(row_index, row)` for every `row_len`-sized row of `data`.
#[cfg(feature = "threaded")]
pub fn for_each_row<T, F>(data: &mut [T], row_len: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync,
{
    if row_len == 0 {
        return;
    }
    let rows = data.len() / row_len;
    let workers = num_cpus::get().min(rows).max(1);
    if workers == 1 {
        for (index, row) in data.chunks_mut(row_len).enumerate() {
            f(index, row);
        }
        return;
    }

    let per_worker = (rows + workers - 1) / workers;
    let f = &f;
    let outcome = crossbeam::scope(|scope| {
        for (block, chunk) in data.chunks_mut(per_worker * row_len).enumerate() {
            scope.spawn(move |_| {
                for (offset, row) in chunk.chunks_mut(row_len).enumerate() {
                    f(block * per_worker + offset, row);
                }
            });
        }
    });
    if let Err(panic) = outcome {
        std::panic::resume_unwind(panic);
    }
}

#[cfg(not(feature = "threaded"))]
pub fn for_each_row<T, F>(data: &mut [T], row_len: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync,
{
    if row_len == 0 {
        return;
    }
    for (index, row) in data.chunks_mut(row_len).enumerate() {
        f(index, row);
    }
}

/// Run both closures, concurrently when threading is enabled, and
/// return both results.
#[cfg(feature = "threaded")]
pub fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    let outcome = crossbeam::scope(|scope| {
        let left = scope.spawn(move |_| a());
        let right = b();
        (left.join(), right)
    });
    match outcome {
        Ok((Ok(left), right)) => (left, right),
        Ok((Err(panic), _)) | Err(panic) => std::panic::resume_unwind(panic),
    }
}

#[cfg(not(feature = "threaded"))]
pub fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    (a(), b())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_row_sees_its_own_index() {
        let mut data = vec![0usize; 7 * 3];
        for_each_row(&mut data, 3, |row, cells| {
            for cell in cells.iter_mut() {
                *cell = row;
            }
        });
        for (index, value) in data.iter().enumerate() {
            assert_eq!(*value, index / 3);
        }
    }

    #[test]
    fn join_returns_both_sides() {
        let (left, right) = join(|| 2 + 2, || "four");
        assert_eq!(left, 4);
        assert_eq!(right, "four");
    }
}
