//! Minimal external producer used to drive the multi-process conservation
//! test (spec §8 Scenario C). This is the Rust analogue of the reference
//! test suite's self-`reexec`'d producer (`original_source/cqueue_test.go`,
//! `reexecEnqueue`): a small standalone binary rather than a re-executed
//! copy of the test harness, since Rust doesn't need argv0 tricks to spawn
//! a fresh, separately-linked process.
//!
//! Usage: `shmq-producer <region-name> <from> <to>` enqueues every value
//! in `[from, to)` into the named region, with occasional small random
//! delays between inserts so concurrent producers interleave.

use std::process::ExitCode;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let (name, from, to) = match parse_args(&args) {
        Some(parsed) => parsed,
        None => {
            eprintln!("usage: {} <region-name> <from> <to>", args[0]);
            return ExitCode::FAILURE;
        }
    };

    let mem = match shm_queue::load_shared(&name) {
        Ok(mem) => mem,
        Err(e) => {
            eprintln!("shmq-producer: failed to open {name}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let queue = mem.list();

    // Seeded per-process, not per-run: the point is to interleave
    // producers nondeterministically across runs, not to reproduce a
    // single run bit-for-bit.
    let mut rng = StdRng::from_entropy();
    for v in from..to {
        if rng.gen_ratio(1, 20) {
            std::thread::sleep(std::time::Duration::from_micros(rng.gen_range(1..200)));
        }
        if let Err(e) = queue.enqueue(v) {
            eprintln!("shmq-producer: enqueue({v}) failed: {e}");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

fn parse_args(args: &[String]) -> Option<(String, u16, u16)> {
    let name = args.get(1)?.clone();
    let from: u16 = args.get(2)?.parse().ok()?;
    let to: u16 = args.get(3)?.parse().ok()?;
    Some((name, from, to))
}
