//! 路由仿真
//!
//! 读取运行参数 JSON，在其网络上运行所选路由协议，打印送达统计。

use clap::Parser;
use qroute_rs::net::NetWorld;
use qroute_rs::router::RouterKind;
use qroute_rs::sim::{RunParams, SimTime, Simulator};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "route-sim", about = "在离散事件网络上运行自适应路由协议")]
struct Args {
    /// 运行参数 JSON
    #[arg(long)]
    run: PathBuf,

    /// 路由协议：link_state 或 simple_q
    #[arg(long, default_value = "link_state")]
    router: String,

    /// 覆盖随机种子
    #[arg(long)]
    seed: Option<u64>,

    /// 仿真运行到的虚拟时间；默认运行到事件耗尽
    #[arg(long)]
    until: Option<f64>,

    /// 覆盖每个节点处理一个数据包的时间
    #[arg(long)]
    pkg_process_delay: Option<f64>,

    /// 把最终统计写成 JSON
    #[arg(long)]
    stats_json: Option<PathBuf>,
}

fn main() -> ExitCode {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let kind: RouterKind = match args.router.parse() {
        Ok(kind) => kind,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    let mut params = match RunParams::from_path(&args.run) {
        Ok(params) => params,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    if let Some(seed) = args.seed {
        params.seed = Some(seed);
    }
    if let Some(delay) = args.pkg_process_delay {
        params.settings.router_env.pkg_process_delay = delay;
    }

    let mut sim = Simulator::default();
    let mut world = NetWorld::from_params(&params, kind);
    world.start(&params, &mut sim);
    let result = world.run(&mut sim, args.until.map(SimTime::from_secs_f64));

    let stats = &world.net.stats;
    let mean = stats
        .mean_delivery_time()
        .map_or_else(|| "n/a".to_string(), |m| format!("{m:.6}"));
    println!(
        "done @ {:.6}, injected={}, delivered={}, dropped={}, mean_delivery={}",
        sim.now().as_secs_f64(),
        stats.injected_pkts,
        stats.delivered_pkts,
        stats.dropped_pkts,
        mean
    );

    if let Some(path) = &args.stats_json {
        let written = serde_json::to_string_pretty(stats)
            .map_err(|e| e.to_string())
            .and_then(|raw| fs::write(path, raw).map_err(|e| e.to_string()));
        if let Err(e) = written {
            eprintln!("error: cannot write {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
