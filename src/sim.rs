use std::io;

use serde::{Deserialize, Serialize};

use crate::{
    error::SimError,
    progress::ProgressBar,
    tlb::SetAssociativeTlb,
    trace::{check_trace_params, generate_trace, TraceRef},
};

/// Everything that determines one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    pub sets: usize,
    pub ways: usize,
    pub vpages: u64,
    pub page_size: u64,
    pub n_accesses: usize,
    pub locality_prob: f64,
    pub locality_window: u64,
    pub t_tlb: u64,
    pub t_mem: u64,
    pub t_pagewalk: u64,
    pub seed: u64,
}

impl Default for SimParams {
    fn default() -> Self {
        SimParams {
            sets: 64,
            ways: 4,
            vpages: 8192,
            page_size: 4096,
            n_accesses: 30_000,
            locality_prob: 0.85,
            locality_window: 16,
            t_tlb: 1,
            t_mem: 100,
            t_pagewalk: 300,
            seed: 123,
        }
    }
}

impl SimParams {
    /// Workload checks. TLB geometry is checked when the TLB is built.
    pub fn validate(&self) -> Result<(), SimError> {
        check_trace_params(
            self.n_accesses,
            self.vpages,
            self.page_size,
            self.locality_prob,
            self.locality_window,
        )?;
        self.check_costs(self.n_accesses)
    }

    /// The all-miss total over `accesses` references must fit in a `u64`.
    fn check_costs(&self, accesses: usize) -> Result<(), SimError> {
        let worst = self
            .t_tlb
            .checked_add(self.t_pagewalk)
            .and_then(|miss| miss.checked_add(self.t_mem))
            .and_then(|miss| miss.checked_mul(accesses as u64));
        match worst {
            Some(_) => Ok(()),
            None => Err(SimError::invalid(
                "t_pagewalk",
                format!("miss cost over {accesses} accesses overflows the cycle counter"),
            )),
        }
    }

    pub fn timing(&self) -> Timing {
        Timing {
            t_tlb: self.t_tlb,
            t_mem: self.t_mem,
            t_pagewalk: self.t_pagewalk,
        }
    }

    pub fn entries(&self) -> usize {
        self.sets * self.ways
    }
}

/// Cycle costs of a translated access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub t_tlb: u64,
    pub t_mem: u64,
    pub t_pagewalk: u64,
}

impl Timing {
    pub fn hit_cost(&self) -> u64 {
        self.t_tlb.saturating_add(self.t_mem)
    }

    pub fn miss_cost(&self) -> u64 {
        self.t_tlb
            .saturating_add(self.t_pagewalk)
            .saturating_add(self.t_mem)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimResult {
    pub accesses: usize,
    pub hits: usize,
    pub misses: usize,
    pub hit_rate: f64,
    #[serde(rename = "EMAT")]
    pub emat: f64,
    pub params: SimParams,
}

/// Runs one simulation: fresh TLB, fresh trace, one pass.
pub fn run_simulation(params: SimParams, show_progress: bool) -> Result<SimResult, SimError> {
    params.validate()?;
    let tlb = SetAssociativeTlb::new(params.sets, params.ways)?;
    let trace = generate_trace(
        params.n_accesses,
        params.vpages,
        params.page_size,
        params.locality_prob,
        params.locality_window,
        params.seed,
    )?;
    log::debug!("simulating {params:?}");

    Ok(drive(tlb, &trace, params, show_progress))
}

/// Runs the driver over an already materialized trace, e.g. one read back
/// from a trace file. `n_accesses` in the reported params is the trace length.
pub fn replay_trace(
    mut params: SimParams,
    trace: &[TraceRef],
    show_progress: bool,
) -> Result<SimResult, SimError> {
    if trace.is_empty() {
        return Err(SimError::invalid("trace", "contains no references"));
    }
    params.check_costs(trace.len())?;
    let tlb = SetAssociativeTlb::new(params.sets, params.ways)?;
    params.n_accesses = trace.len();
    log::debug!("replaying {} references with {params:?}", trace.len());

    Ok(drive(tlb, trace, params, show_progress))
}

fn drive(
    mut tlb: SetAssociativeTlb,
    trace: &[TraceRef],
    params: SimParams,
    show_progress: bool,
) -> SimResult {
    let timing = params.timing();
    let accesses = trace.len();
    let mut progress = show_progress.then(|| ProgressBar::new(accesses, io::stderr()));

    let mut hits = 0;
    let mut total_time: u64 = 0;
    for (i, r) in trace.iter().enumerate() {
        if tlb.access(r.vpn).is_hit() {
            hits += 1;
            total_time += timing.hit_cost();
        } else {
            total_time += timing.miss_cost();
        }
        if let Some(bar) = progress.as_mut() {
            bar.update(i + 1);
        }
    }
    if let Some(bar) = progress {
        bar.finish();
    }

    let result = SimResult {
        accesses,
        hits,
        misses: accesses - hits,
        hit_rate: hits as f64 / accesses as f64,
        emat: total_time as f64 / accesses as f64,
        params,
    };
    log::info!(
        "sets={} ways={}: {} hits / {} accesses, EMAT {:.2}",
        params.sets,
        params.ways,
        result.hits,
        result.accesses,
        result.emat
    );
    result
}
