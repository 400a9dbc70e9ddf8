// SPDX-License-Identifier: Apache-2.0

//! Scores a mapped netlist: area, static and dynamic power, and the
//! constraint-penalized cost.

use aigmap::library::load_library_from_path;
use aigmap::netlist::{evaluate, parse_netlist_file, PinOrder};
use aigmap::timing::{ScopedTimer, TimingReport};
use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    netlist: PathBuf,

    library: PathBuf,

    /// Instances list the output pin first and have no instance names.
    #[clap(long)]
    abc: bool,

    /// Print the result as JSON.
    #[clap(long)]
    json: bool,
}

fn main() -> Result<()> {
    let _ = env_logger::builder().try_init();
    let args = Args::parse();
    let mut timing = TimingReport::default();

    let order = if args.abc {
        PinOrder::OutputFirst
    } else {
        PinOrder::InputsFirst
    };
    let t = ScopedTimer::start("load:netlist");
    let netlist = parse_netlist_file(&args.netlist, order).map_err(|e| anyhow!(e))?;
    t.finish(&mut timing);

    let t = ScopedTimer::start("load:library");
    let library = load_library_from_path(&args.library).map_err(|e| anyhow!(e))?;
    t.finish(&mut timing);

    let t = ScopedTimer::start("eval");
    let cost = evaluate(&netlist, &library)?;
    t.finish(&mut timing);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&cost)?);
    } else {
        println!("area      = {:.12}", cost.area);
        println!("power     = {:.12}", cost.static_power);
        println!("dyn_power = {:.12}", cost.dynamic_power);
        println!("cost = {:.12}", cost.cost);
    }
    timing.log_summary();
    Ok(())
}
