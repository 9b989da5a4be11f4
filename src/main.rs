use std::{error::Error, fmt::Display, fs, path::PathBuf, process, str::FromStr};

use pico_args::Arguments;
use serde::Serialize;

use tlb_sim::{
    compare::{compare, ScenarioRow, SweptParam},
    config::Config,
    report,
    sim::{replay_trace, run_simulation, SimParams},
    trace::{generate_trace, TraceFile},
};

const HELP: &str = "\
tlb_sim: set-associative TLB simulator

USAGE:
  tlb_sim [run] [PARAMS] [--progress] [--trace <file.xz>] [--json <out>]
  tlb_sim compare [PARAMS] [--json <out>]
  tlb_sim trace [PARAMS] -o <file.xz>

PARAMS (override the configuration):
  --config <json>          Inline JSON configuration
  -p <path>                JSON configuration file
  --sets <n>               Number of sets (power of two)   [64]
  --ways <n>               Associativity                   [4]
  --vpages <n>             Virtual pages                   [8192]
  --page-size <n>          Page size in bytes              [4096]
  --accesses <n>           Trace length                    [30000]
  --locality-prob <p>      Locality probability in [0, 1]  [0.85]
  --locality-window <n>    Locality window in pages        [16]
  --t-tlb <n>              TLB lookup cost                 [1]
  --t-mem <n>              Memory access cost              [100]
  --t-pagewalk <n>         Page walk cost                  [300]
  --seed <n>               Random seed                     [123]
";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run_cli(Arguments::from_env()) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run_cli(mut args: Arguments) -> Result<(), Box<dyn Error>> {
    let command = args.subcommand()?.unwrap_or_else(|| "run".to_string());
    if args.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let mut config = load_config(&mut args)?;
    apply_overrides(&mut args, &mut config.params)?;
    let params = config.params;
    params.validate()?;

    match command.as_str() {
        "run" => {
            let show_progress = args.contains("--progress");
            let trace_path: Option<PathBuf> = args.opt_value_from_str("--trace")?;
            let json_path: Option<PathBuf> = args.opt_value_from_str("--json")?;
            finish(args)?;

            let result = match trace_path {
                Some(path) => replay_trace(params, &TraceFile::read(&path)?, show_progress)?,
                None => run_simulation(params, show_progress)?,
            };
            print!("{}", report::format_result("RESULTS", &result));
            if let Some(path) = json_path {
                write_json(path, &result)?;
            }
        }
        "compare" => {
            let json_path: Option<PathBuf> = args.opt_value_from_str("--json")?;
            finish(args)?;

            let mut tables = Vec::new();
            for sweep in config.sweeps() {
                match sweep.param {
                    SweptParam::Ways => println!(
                        "\nComparing ways in {:?} with fixed sets = {}",
                        sweep.values, params.sets
                    ),
                    SweptParam::Sets => println!(
                        "\nComparing sets in {:?} with fixed ways = {}",
                        sweep.values, params.ways
                    ),
                }
                let rows = compare(&params, &sweep)?;
                print!("{}", report::format_sweep(&sweep, &rows));
                tables.push(SweepTable {
                    param: sweep.param,
                    rows,
                });
            }
            if let Some(path) = json_path {
                write_json(
                    path,
                    &CompareOutput {
                        params,
                        sweeps: tables,
                    },
                )?;
            }
        }
        "trace" => {
            let out: PathBuf = args.value_from_str(["-o", "--output"])?;
            finish(args)?;

            let refs = generate_trace(
                params.n_accesses,
                params.vpages,
                params.page_size,
                params.locality_prob,
                params.locality_window,
                params.seed,
            )?;
            TraceFile::write(&out, &refs)?;
            println!("Wrote {} references to {}", refs.len(), out.display());
        }
        other => return Err(format!("unknown command `{other}`, see --help").into()),
    }
    Ok(())
}

#[derive(Serialize)]
struct SweepTable {
    param: SweptParam,
    rows: Vec<ScenarioRow>,
}

#[derive(Serialize)]
struct CompareOutput {
    params: SimParams,
    sweeps: Vec<SweepTable>,
}

fn load_config(args: &mut Arguments) -> Result<Config, Box<dyn Error>> {
    if let Some(config_str) = args.opt_value_from_str::<_, String>("--config")? {
        return Ok(Config::from_json(&config_str)?);
    }
    match args.opt_value_from_str::<_, PathBuf>("-p")? {
        Some(config_path) => Ok(Config::from_file(&config_path)?),
        None => Ok(Config::default()),
    }
}

fn apply_overrides(args: &mut Arguments, params: &mut SimParams) -> Result<(), pico_args::Error> {
    override_with(args, "--sets", &mut params.sets)?;
    override_with(args, "--ways", &mut params.ways)?;
    override_with(args, "--vpages", &mut params.vpages)?;
    override_with(args, "--page-size", &mut params.page_size)?;
    override_with(args, "--accesses", &mut params.n_accesses)?;
    override_with(args, "--locality-prob", &mut params.locality_prob)?;
    override_with(args, "--locality-window", &mut params.locality_window)?;
    override_with(args, "--t-tlb", &mut params.t_tlb)?;
    override_with(args, "--t-mem", &mut params.t_mem)?;
    override_with(args, "--t-pagewalk", &mut params.t_pagewalk)?;
    override_with(args, "--seed", &mut params.seed)?;
    Ok(())
}

fn override_with<T>(
    args: &mut Arguments,
    key: &'static str,
    slot: &mut T,
) -> Result<(), pico_args::Error>
where
    T: FromStr,
    T::Err: Display,
{
    if let Some(value) = args.opt_value_from_str(key)? {
        *slot = value;
    }
    Ok(())
}

fn finish(args: Arguments) -> Result<(), Box<dyn Error>> {
    let remaining = args.finish();
    if remaining.is_empty() {
        Ok(())
    } else {
        Err(format!("unexpected arguments: {remaining:?}").into())
    }
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<(), Box<dyn Error>> {
    let stats_file = fs::File::create(&path)?;
    serde_json::to_writer_pretty(stats_file, value)?;
    log::info!("wrote statistics to {}", path.display());
    Ok(())
}
