use std::num::NonZero;

use num_integer::Integer;

/// Splits `total` elements between `parts` ranks as evenly as possible.
///
/// Every rank receives either `total / parts` or one more element; the first `total % parts`
/// ranks receive the extra element. The counts always sum to `total`.
///
/// # Examples
///
/// ```
/// use new_zealand::nz;
/// use rank_comm::partition_counts;
///
/// assert_eq!(partition_counts(10, nz!(4)), [3, 3, 2, 2]);
/// assert_eq!(partition_counts(2, nz!(3)), [1, 1, 0]);
/// ```
#[must_use]
pub fn partition_counts(total: usize, parts: NonZero<usize>) -> Vec<usize> {
    let (base, extra) = total.div_rem(&parts.get());

    (0..parts.get())
        .map(|rank| if rank < extra { base.wrapping_add(1) } else { base })
        .collect()
}

/// Returns the offset of each partition produced by [`partition_counts()`].
///
/// # Examples
///
/// ```
/// use rank_comm::partition_offsets;
///
/// assert_eq!(partition_offsets(&[3, 3, 2, 2]), [0, 3, 6, 8]);
/// ```
#[must_use]
pub fn partition_offsets(counts: &[usize]) -> Vec<usize> {
    counts
        .iter()
        .scan(0_usize, |offset, count| {
            let start = *offset;
            *offset = offset.wrapping_add(*count);
            Some(start)
        })
        .collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use new_zealand::nz;

    use super::*;

    #[test]
    fn even_split() {
        assert_eq!(partition_counts(12, nz!(3)), [4, 4, 4]);
    }

    #[test]
    fn remainder_goes_to_first_ranks() {
        assert_eq!(partition_counts(7, nz!(3)), [3, 2, 2]);
    }

    #[test]
    fn counts_sum_to_total() {
        for total in 0..50 {
            for parts in 1..9 {
                let counts = partition_counts(total, NonZero::new(parts).unwrap());
                assert_eq!(counts.len(), parts);
                assert_eq!(counts.iter().sum::<usize>(), total);
            }
        }
    }

    #[test]
    fn zero_total_gives_empty_parts() {
        assert_eq!(partition_counts(0, nz!(2)), [0, 0]);
    }

    #[test]
    fn offsets_accumulate() {
        assert_eq!(partition_offsets(&[]), Vec::<usize>::new());
        assert_eq!(partition_offsets(&[0, 5, 1]), [0, 0, 5]);
    }
}
