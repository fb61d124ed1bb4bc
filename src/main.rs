//! VELA demo: encrypted vector arithmetic through handles, with timing stats

use std::error::Error;
use std::time::Instant;

use csv::Writer;
use env_logger::Env;
use log::info;
use serde::Serialize;
use vela_core::{Engine, Params, Ptxt};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // -------------- 計測用 CSV ライタ --------------
    let mut wtr = Writer::from_path("handle_stats.csv")?;

    let params = Params::demo();
    println!("Initializing VELA engine:");
    println!(
        "p = {}, q = {}, deg = {}, dim = {}",
        params.p, params.q, params.deg, params.dim
    );
    let engine = Engine::new(params)?;
    info!("plaintext range is ±{}", engine.plain_bound());

    let start = Instant::now();

    let t = Instant::now();
    let a = engine.encrypt(&Ptxt::new(vec![1, 2, 3])?)?;
    let b = engine.encrypt(&Ptxt::new(vec![10, 20, 30])?)?;
    record(&mut wtr, "encrypt", a.len(), t, &engine)?;
    println!("a = {:?}", engine.decrypt(&a)?);
    println!("b = {:?}", engine.decrypt(&b)?);

    let t = Instant::now();
    let sum = a.try_add(&b)?;
    record(&mut wtr, "add", sum.len(), t, &engine)?;
    println!("a + b = {:?}", engine.decrypt(&sum)?);

    let t = Instant::now();
    let scaled = sum.try_mul(2)?;
    record(&mut wtr, "mul_scalar", scaled.len(), t, &engine)?;
    println!("(a + b) * 2 = {:?}", engine.decrypt(&scaled)?);

    let t = Instant::now();
    let dot = a.try_dot(&b)?;
    record(&mut wtr, "dot", dot.len(), t, &engine)?;
    println!("a @ b = {:?}", engine.decrypt(&dot)?);

    let t = Instant::now();
    let mut acc = a.try_clone()?;
    acc += &b;
    acc -= 5;
    record(&mut wtr, "inplace", acc.len(), t, &engine)?;
    println!("a + b - 5 = {:?}", engine.decrypt(&acc)?);

    println!("\nNoise levels:");
    println!("fresh   : {:?}", engine.slot_levels(&a)?);
    println!("product : {:?}", engine.slot_levels(&dot)?);
    println!("budget  : {}", engine.params().level_bound());

    println!("\nTest completed:");
    println!("Total time: {:?}", start.elapsed());
    println!("Live slots: {}", engine.allocated_slots());

    drop(sum);
    drop(scaled);
    drop(dot);
    drop(acc);
    drop(a);
    drop(b);
    println!("After release: {}", engine.allocated_slots());

    wtr.flush()?;           // 忘れずフラッシュ
    Ok(())
}

// One stat row per timed operation; the header comes from the field names.
#[derive(Serialize)]
struct StatRow<'a> {
    op: &'a str,
    len: usize,
    time_us: u128,
    slots: usize,
}

fn record(
    wtr: &mut Writer<std::fs::File>,
    op: &str,
    len: usize,
    t: Instant,
    engine: &Engine,
) -> Result<(), Box<dyn Error>> {
    wtr.serialize(StatRow {
        op,
        len,
        time_us: t.elapsed().as_micros(),
        slots: engine.allocated_slots(),
    })?;
    Ok(())
}
