//! Collective operations composed the way distributed tasks use them.

use std::num::NonZero;

use new_zealand::nz;
use rank_comm::{World, partition_counts};
use testing::{assert_all_close, with_watchdog};

#[test]
fn scatter_compute_gather_matches_sequential() {
    with_watchdog(|| {
        let input: Vec<f64> = (0..23).map(|i| f64::from(i) * 0.5).collect();
        let expected: Vec<f64> = input.iter().map(|v| v * v).collect();

        for participants in 1..=5 {
            let world = World::new(NonZero::new(participants).unwrap());

            let gathered = world.run(|comm| {
                let counts = partition_counts(input.len(), comm.size());
                let data = comm.is_root().then_some(input.as_slice());

                let local = comm.scatterv(data, &counts, 0).unwrap();
                let squared = local.iter().map(|v| v * v).collect();

                comm.gatherv(squared, 0).unwrap()
            });

            assert_all_close(gathered[0].as_deref().unwrap(), &expected, 1e-12);
            assert!(gathered[1..].iter().all(Option::is_none));
        }
    });
}

#[test]
fn ring_exchange_passes_token_around() {
    with_watchdog(|| {
        let world = World::new(nz!(4));

        let tokens = world.run(|comm| {
            let size = comm.size().get();
            let next = (comm.rank() + 1) % size;
            let previous = (comm.rank() + size - 1) % size;

            if comm.is_root() {
                comm.send(next, 0, vec![0_usize]).unwrap();
                comm.recv::<Vec<usize>>(previous, 0).unwrap()
            } else {
                let mut token = comm.recv::<Vec<usize>>(previous, 0).unwrap();
                token.push(comm.rank());
                comm.send(next, 0, token).unwrap();
                Vec::new()
            }
        });

        assert_eq!(tokens[0], [0, 1, 2, 3]);
    });
}

#[test]
fn repeated_collectives_stay_in_step() {
    with_watchdog(|| {
        let world = World::new(nz!(3));

        let totals = world.run(|comm| {
            let mut total = 0_u64;
            for round in 0..20_u64 {
                let local = round * 10 + u64::try_from(comm.rank()).unwrap();
                total += comm.all_reduce(local, |a, b| a + b).unwrap();
                comm.barrier().unwrap();
            }
            total
        });

        // Each round contributes 3 * round * 10 + (0 + 1 + 2).
        let expected: u64 = (0..20_u64).map(|round| round * 30 + 3).sum();
        assert_eq!(totals, [expected; 3]);
    });
}
