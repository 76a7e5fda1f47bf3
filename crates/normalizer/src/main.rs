use std::io::{BufRead, Write};

use serde_json::{Map, Value};
use tracing::warn;

mod boot;
mod conf;

fn main() -> anyhow::Result<()> {
    boot::init_logging();
    let (ctx, config) = boot::boot()?;

    if config.dump_dot {
        print!("{}", ctx.dot_graph(ctx.root()));
        return Ok(());
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut unmatched = 0usize;

    for line in stdin.lock().lines() {
        let line = line?;
        let mut record = Map::new();
        if ctx.normalize(&line, &mut record).is_err() {
            unmatched += 1;
        }
        serde_json::to_writer(&mut out, &Value::Object(record))?;
        out.write_all(b"\n")?;
    }

    if unmatched > 0 {
        warn!("{} line(s) matched no rule", unmatched);
    }
    Ok(())
}
