use anyhow::Result;
use cordyceps_avl::Sequence;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut seq = Sequence::new();

    for i in 0..20 {
        seq.insert(i, i)?;
        seq.assert_invariants();
    }
    println!("{seq:?}");

    for _ in 0..5 {
        let removed = seq.erase(3)?;
        info!(removed, len = seq.len(), "erased");
        seq.assert_invariants();
    }
    println!("{seq:?}");

    seq.insert(0, 100)?;
    seq.set(seq.len() - 1, 200)?;
    seq.assert_invariants();
    println!("{seq:?}");

    if let Err(err) = seq.get(seq.len()) {
        info!(%err, "rejected as expected");
    }

    let mut graph = String::new();
    seq.dotgraph("demo", &mut graph)?;
    println!("{graph}");

    Ok(())
}
