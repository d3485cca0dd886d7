use clap::Parser;

use symbolic_bdd::bdd::BddConfig;
use symbolic_bdd::manager::{Dd, DdManager};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of counter bits.
    #[arg(value_name = "INT", default_value = "10")]
    bits: usize,

    /// Node limit for each image computation.
    #[clap(long, value_name = "INT")]
    max_nodes: Option<usize>,

    /// Time limit for the whole search, in milliseconds.
    #[clap(long, value_name = "MS")]
    time_limit: Option<u64>,

    /// Initial compute table size (in bits).
    #[clap(long, value_name = "INT", default_value = "16")]
    cache: u32,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    // Interleaved order: bit i is variable 2i, its successor copy is 2i+1.
    let n = args.bits;
    let config = BddConfig::default().with_cache_bits(args.cache);
    let mgr = DdManager::with_config(2 * n, config);
    if let Some(ms) = args.time_limit {
        mgr.set_time_limit(ms);
    }

    let pre: Vec<Dd> = (0..n).map(|i| mgr.variable(2 * i)).collect::<Result<_, _>>()?;
    let succ: Vec<Dd> = (0..n).map(|i| mgr.variable(2 * i + 1)).collect::<Result<_, _>>()?;

    // Counter increment: x_i' = x_i ^ carry_i, carry_0 = 1, carry_{i+1} = carry_i & x_i.
    println!("Encoding {}-bit counter...", n);
    let mut relation = mgr.one();
    let mut carry = mgr.one();
    for i in 0..n {
        let flipped = mgr.xor(pre[i], carry, None)?;
        let bit = mgr.xnor(succ[i], flipped, None)?;
        relation = mgr.and(relation, bit, None)?;
        carry = mgr.and(carry, pre[i], None)?;
    }
    mgr.register(relation)?;
    println!("relation of size {}", mgr.node_count(relation)?);

    let mut init = mgr.one();
    for &x in pre.iter() {
        init = mgr.and(init, mgr.not(x)?, None)?;
    }

    let pre_cube = mgr.cube(&pre)?;

    println!("Searching...");
    let mut reached = init;
    let mut frontier = init;
    let mut steps = 0;
    loop {
        let image = mgr.relation_product_next(frontier, relation, pre_cube, &pre, &succ, args.max_nodes)?;
        let fresh = mgr.and(image, mgr.not(reached)?, None)?;
        if mgr.is_zero(fresh) {
            break;
        }
        reached = mgr.or(reached, fresh, None)?;
        frontier = fresh;
        steps += 1;
        if steps % 128 == 0 {
            log::info!("step {}: reached has {} nodes", steps, mgr.node_count(reached)?);
        }
    }

    // Successor variables are free in `reached`, so every state is counted 2^n times.
    let states = mgr.sat_count(reached)? >> n;
    println!("Reached {} states in {} steps", states, steps);
    println!("reached of size {}", mgr.node_count(reached)?);

    mgr.deregister(relation)?;
    mgr.show_info();
    println!("stats = {:?}", mgr.stats());

    let time_total = time_total.elapsed();
    println!("Done in {:.1} s", time_total.as_secs_f64());

    Ok(())
}
