use std::fmt::Write;

use crate::{
    compare::{ScenarioRow, Sweep},
    sim::SimResult,
};

const HIT_BAR_LEN: usize = 40;

pub fn hit_bar(hit_rate: f64) -> String {
    let filled = ((hit_rate * HIT_BAR_LEN as f64) as usize).min(HIT_BAR_LEN);
    "█".repeat(filled) + &"·".repeat(HIT_BAR_LEN - filled)
}

pub fn format_result(title: &str, result: &SimResult) -> String {
    let p = &result.params;
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", "=".repeat(64));
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(64));
    let _ = writeln!(
        out,
        "TLB: sets={}  ways={}  entries={}",
        p.sets,
        p.ways,
        p.entries()
    );
    let _ = writeln!(
        out,
        "Trace: accesses={}, vpages={}, page_size={}",
        result.accesses, p.vpages, p.page_size
    );
    let _ = writeln!(
        out,
        "Locality: prob={:.2}, window={}",
        p.locality_prob, p.locality_window
    );
    let _ = writeln!(
        out,
        "Costs: t_tlb={}, t_mem={}, t_pagewalk={}",
        p.t_tlb, p.t_mem, p.t_pagewalk
    );
    let _ = writeln!(out, "{}", "-".repeat(64));
    let _ = writeln!(out, "{:>16}: {}", "TLB hits", result.hits);
    let _ = writeln!(out, "{:>16}: {}", "TLB misses", result.misses);
    let _ = writeln!(out, "{:>16}: {:.2}%", "Hit rate", result.hit_rate * 100.0);
    let _ = writeln!(out, "{:>16}: {:.2} (relative units)", "EMAT", result.emat);
    let _ = writeln!(out, "{:>16}: {}", "Hit bar", hit_bar(result.hit_rate));
    out
}

pub fn format_sweep(sweep: &Sweep, rows: &[ScenarioRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>6} | {:>10} | {:>10}", sweep.param, "hit_rate", "EMAT");
    let _ = writeln!(out, "{}", "-".repeat(33));
    for row in rows {
        let _ = writeln!(
            out,
            "{:6} | {:9.2}% | {:9.2}",
            row.value,
            row.hit_rate * 100.0,
            row.emat
        );
    }
    out
}
