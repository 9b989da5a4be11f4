use std::{fmt, num::NonZeroUsize, panic, thread};

use serde::{Deserialize, Serialize};

use crate::{
    error::SimError,
    sim::{run_simulation, SimParams},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweptParam {
    Ways,
    Sets,
}

impl fmt::Display for SweptParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweptParam::Ways => f.pad("ways"),
            SweptParam::Sets => f.pad("sets"),
        }
    }
}

/// One dimension varied over a list of values, everything else held fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sweep {
    pub param: SweptParam,
    pub values: Vec<usize>,
}

impl Sweep {
    pub fn ways(values: Vec<usize>) -> Self {
        Sweep {
            param: SweptParam::Ways,
            values,
        }
    }

    pub fn sets(values: Vec<usize>) -> Self {
        Sweep {
            param: SweptParam::Sets,
            values,
        }
    }

    fn point(&self, base: &SimParams, value: usize) -> Option<SimParams> {
        match self.param {
            SweptParam::Ways => Some(SimParams { ways: value, ..*base }),
            SweptParam::Sets if !value.is_power_of_two() => {
                log::debug!("skipping sets={value}: not a power of two");
                None
            }
            SweptParam::Sets => Some(SimParams { sets: value, ..*base }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioRow {
    pub value: usize,
    pub hit_rate: f64,
    #[serde(rename = "EMAT")]
    pub emat: f64,
}

/// Runs one simulation per swept value, at most one thread per available core
/// at a time, and returns the rows in sweep order. The seed comes from `base`, so every point sees the same trace.
pub fn compare(base: &SimParams, sweep: &Sweep) -> Result<Vec<ScenarioRow>, SimError> {
    let points: Vec<(usize, SimParams)> = sweep
        .values
        .iter()
        .filter_map(|&value| sweep.point(base, value).map(|p| (value, p)))
        .collect();
    log::debug!("sweeping {} over {} points", sweep.param, points.len());

    let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
    let mut results = Vec::with_capacity(points.len());
    for batch in points.chunks(workers) {
        let batch_results = crossbeam::scope(|s| {
            let handles: Vec<_> = batch
                .iter()
                .map(|&(value, params)| s.spawn(move |_| (value, run_simulation(params, false))))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
                .collect::<Vec<_>>()
        })
        .unwrap_or_else(|payload| panic::resume_unwind(payload));
        results.extend(batch_results);
    }

    results
        .into_iter()
        .map(|(value, result)| {
            result.map(|r| ScenarioRow {
                value,
                hit_rate: r.hit_rate,
                emat: r.emat,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ways_sweep_matches_reference() {
        let rows = compare(&SimParams::default(), &Sweep::ways(vec![1, 2, 4, 8])).unwrap();
        let values: Vec<_> = rows.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![1, 2, 4, 8]);
        let hits: Vec<_> = rows
            .iter()
            .map(|r| (r.hit_rate * 30_000.0).round() as usize)
            .collect();
        assert_eq!(hits, vec![7498, 7720, 8073, 8768]);
        assert_eq!(rows[0].emat, 326.02);
        assert_eq!(rows[3].emat, 313.32);
    }

    #[test]
    fn more_ways_never_lowers_hit_rate() {
        let base = SimParams {
            sets: 16,
            n_accesses: 10_000,
            seed: 2024,
            ..SimParams::default()
        };
        let rows = compare(&base, &Sweep::ways(vec![1, 2, 4, 8, 16])).unwrap();
        for pair in rows.windows(2) {
            assert!(pair[1].hit_rate >= pair[0].hit_rate);
        }
    }

    #[test]
    fn sets_sweep_skips_non_powers_of_two() {
        let rows = compare(
            &SimParams::default(),
            &Sweep::sets(vec![8, 12, 16, 32, 48, 64, 128]),
        )
        .unwrap();
        let values: Vec<_> = rows.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![8, 16, 32, 64, 128]);
        assert_eq!(rows[0].emat, 327.25);
        assert_eq!(rows[4].emat, 313.55);
    }

    #[test]
    fn sweep_matches_individual_runs() {
        let base = SimParams {
            n_accesses: 4000,
            ..SimParams::default()
        };
        let rows = compare(&base, &Sweep::ways(vec![2, 8])).unwrap();
        for row in rows {
            let single = run_simulation(SimParams { ways: row.value, ..base }, false).unwrap();
            assert_eq!(row.hit_rate, single.hit_rate);
            assert_eq!(row.emat, single.emat);
        }
    }

    #[test]
    fn long_sweep_keeps_order() {
        let base = SimParams {
            n_accesses: 500,
            ..SimParams::default()
        };
        let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let values: Vec<usize> = (1..=3 * workers + 1).collect();
        let rows = compare(&base, &Sweep::ways(values.clone())).unwrap();
        assert_eq!(rows.iter().map(|r| r.value).collect::<Vec<_>>(), values);
        for pair in rows.windows(2) {
            assert!(pair[1].hit_rate >= pair[0].hit_rate);
        }
    }

    #[test]
    fn zero_ways_propagates_error() {
        assert!(matches!(
            compare(&SimParams::default(), &Sweep::ways(vec![2, 0])),
            Err(SimError::Config(_))
        ));
    }
}
