//! Seeded random fork/join programs.
//!
//! A [`RandomProgram`] is a tree of steps over two banks of `i64`
//! values: additive counters and overwrite registers. It can be run on
//! the real runtime with [`RandomProgram::run`], or evaluated by a plain
//! sequential interpreter with [`RandomProgram::oracle`]. The two must
//! agree for every seed.
//!
//! The oracle models join semantics directly: a child's outcome depends
//! only on the state at its fork, so it is evaluated eagerly at the fork
//! and merged at the matching join.

use braid_core::Additive;
use braid_engine::{fork, join, RevisionHandle, Runtime, Versioned};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// One instruction of a random program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Add `amount` to additive counter `var`.
    Add { var: usize, amount: i64 },
    /// Store `value` in overwrite register `var`.
    Set { var: usize, value: i64 },
    /// Fork a child revision that runs `body`.
    Fork { body: Vec<Step> },
    /// Join the most recently forked child that is not yet joined.
    /// No-op if there is none.
    Join,
}

/// Size limits for [`RandomProgram::generate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgramShape {
    pub counters: usize,
    pub registers: usize,
    /// Steps in the top-level body. Each nesting level halves it.
    pub steps: usize,
    pub max_depth: usize,
}

impl Default for ProgramShape {
    fn default() -> Self {
        Self {
            counters: 3,
            registers: 3,
            steps: 12,
            max_depth: 3,
        }
    }
}

/// A generated program and the shape it was generated with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomProgram {
    pub shape: ProgramShape,
    pub body: Vec<Step>,
}

/// Final values of a program run: counters, then registers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub counters: Vec<i64>,
    pub registers: Vec<i64>,
}

fn below(rng: &mut ChaCha8Rng, n: usize) -> usize {
    (rng.next_u64() % n as u64) as usize
}

fn small(rng: &mut ChaCha8Rng) -> i64 {
    (rng.next_u64() % 201) as i64 - 100
}

impl RandomProgram {
    /// Deterministically generate a program from `seed`.
    pub fn generate(seed: u64, shape: ProgramShape) -> Self {
        assert!(shape.counters > 0 && shape.registers > 0);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let body = Self::generate_body(&mut rng, &shape, shape.steps, 0);
        Self { shape, body }
    }

    fn generate_body(
        rng: &mut ChaCha8Rng,
        shape: &ProgramShape,
        len: usize,
        depth: usize,
    ) -> Vec<Step> {
        (0..len.max(1))
            .map(|_| match below(rng, 10) {
                0..=2 => Step::Add {
                    var: below(rng, shape.counters),
                    amount: small(rng),
                },
                3..=5 => Step::Set {
                    var: below(rng, shape.registers),
                    value: small(rng),
                },
                6 | 7 if depth < shape.max_depth => Step::Fork {
                    body: Self::generate_body(rng, shape, len / 2, depth + 1),
                },
                _ => Step::Join,
            })
            .collect()
    }

    /// Run the program on `runtime` inside a fresh root revision.
    pub fn run(&self, runtime: &Runtime) -> Outcome {
        runtime.enter(|| {
            let banks = Banks {
                counters: (0..self.shape.counters).map(|_| Versioned::new()).collect(),
                registers: (0..self.shape.registers).map(|_| Versioned::new()).collect(),
            };
            execute(&self.body, &banks);
            Outcome {
                counters: banks
                    .counters
                    .iter()
                    .map(|v| v.get().expect("declared in scope"))
                    .collect(),
                registers: banks
                    .registers
                    .iter()
                    .map(|v| v.get().expect("declared in scope"))
                    .collect(),
            }
        })
    }

    /// Evaluate the program sequentially, without the runtime.
    pub fn oracle(&self) -> Outcome {
        let start = Sim {
            counters: vec![0; self.shape.counters],
            registers: vec![0; self.shape.registers],
            counters_written: vec![false; self.shape.counters],
            registers_written: vec![false; self.shape.registers],
        };
        let end = simulate(&self.body, start);
        Outcome {
            counters: end.counters,
            registers: end.registers,
        }
    }

    /// Number of `Fork` steps anywhere in the program.
    pub fn fork_count(&self) -> usize {
        fn count(steps: &[Step]) -> usize {
            steps
                .iter()
                .map(|s| match s {
                    Step::Fork { body } => 1 + count(body),
                    _ => 0,
                })
                .sum()
        }
        count(&self.body)
    }
}

#[derive(Clone)]
struct Banks {
    counters: Vec<Versioned<i64, Additive>>,
    registers: Vec<Versioned<i64>>,
}

fn execute(steps: &[Step], banks: &Banks) {
    let mut pending: Vec<RevisionHandle<()>> = Vec::new();
    for step in steps {
        match step {
            Step::Add { var, amount } => banks.counters[*var]
                .update(|x| x + amount)
                .expect("declared before fork"),
            Step::Set { var, value } => banks.registers[*var].set(*value),
            Step::Fork { body } => {
                let body = body.clone();
                let banks = banks.clone();
                pending.push(fork(move || execute(&body, &banks)).expect("fork"));
            }
            Step::Join => {
                if let Some(handle) = pending.pop() {
                    join(handle).expect("join");
                }
            }
        }
    }
    while let Some(handle) = pending.pop() {
        join(handle).expect("join");
    }
}

#[derive(Clone)]
struct Sim {
    counters: Vec<i64>,
    registers: Vec<i64>,
    counters_written: Vec<bool>,
    registers_written: Vec<bool>,
}

impl Sim {
    /// Apply a joined child's final state: `ancestor` is this state at
    /// the child's fork.
    fn absorb(&mut self, ancestor: &Sim, child: &Sim) {
        for i in 0..self.counters.len() {
            if child.counters_written[i] {
                self.counters[i] += child.counters[i] - ancestor.counters[i];
                self.counters_written[i] = true;
            }
        }
        for i in 0..self.registers.len() {
            if child.registers_written[i] {
                self.registers[i] = child.registers[i];
                self.registers_written[i] = true;
            }
        }
    }

    fn forked(&self) -> Sim {
        Sim {
            counters: self.counters.clone(),
            registers: self.registers.clone(),
            counters_written: vec![false; self.counters.len()],
            registers_written: vec![false; self.registers.len()],
        }
    }
}

fn simulate(steps: &[Step], mut state: Sim) -> Sim {
    let mut pending: Vec<(Sim, Sim)> = Vec::new();
    for step in steps {
        match step {
            Step::Add { var, amount } => {
                state.counters[*var] += amount;
                state.counters_written[*var] = true;
            }
            Step::Set { var, value } => {
                state.registers[*var] = *value;
                state.registers_written[*var] = true;
            }
            Step::Fork { body } => {
                let ancestor = state.forked();
                let child = simulate(body, ancestor.clone());
                pending.push((ancestor, child));
            }
            Step::Join => {
                if let Some((ancestor, child)) = pending.pop() {
                    state.absorb(&ancestor, &child);
                }
            }
        }
    }
    while let Some((ancestor, child)) = pending.pop() {
        state.absorb(&ancestor, &child);
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_seeded() {
        let shape = ProgramShape::default();
        assert_eq!(RandomProgram::generate(7, shape), RandomProgram::generate(7, shape));
        assert_ne!(RandomProgram::generate(7, shape), RandomProgram::generate(8, shape));
    }

    #[test]
    fn oracle_handles_nested_join() {
        // Root forks a child that forks a grandchild; both add to the
        // same counter while root adds too.
        let program = RandomProgram {
            shape: ProgramShape {
                counters: 1,
                registers: 1,
                steps: 0,
                max_depth: 2,
            },
            body: vec![
                Step::Add { var: 0, amount: 1 },
                Step::Fork {
                    body: vec![
                        Step::Fork {
                            body: vec![Step::Add { var: 0, amount: 100 }],
                        },
                        Step::Add { var: 0, amount: 10 },
                        Step::Set { var: 0, value: 5 },
                    ],
                },
                Step::Add { var: 0, amount: 1000 },
                Step::Join,
            ],
        };
        assert_eq!(
            program.oracle(),
            Outcome {
                counters: vec![1111],
                registers: vec![5],
            }
        );
    }

    #[test]
    fn unjoined_forks_are_counted() {
        let program = RandomProgram {
            shape: ProgramShape::default(),
            body: vec![
                Step::Fork {
                    body: vec![Step::Fork { body: vec![] }],
                },
                Step::Fork { body: vec![] },
            ],
        };
        assert_eq!(program.fork_count(), 3);
    }
}
