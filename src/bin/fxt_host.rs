//! Minimal host CLI: load a Node JSON document and run it. The TShell
//! command surface and concrete hardware Card drivers are external
//! collaborators and out of scope here -- this binary only exercises the
//! core engine end to end.

use std::io::Read;

use anyhow::Context;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let path = std::env::args().nth(1).context("usage: fxt_host <node.json>")?;
    let mut file = std::fs::File::open(&path).with_context(|| format!("opening {path}"))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).context("reading node document")?;
    let document: serde_json::Value = serde_json::from_str(&contents).context("parsing node document")?;

    foxtail::node::Node::initialize(&document).map_err(|e| anyhow::anyhow!("failed to build node: {e}"))?;
    let mut node = foxtail::node::Node::take().context("node slot unexpectedly empty after initialize")?;

    node.start().map_err(|e| anyhow::anyhow!("failed to start node: {e}"))?;
    log::info!("node started; Chassis threads are now running");

    // Process lifecycle (signal handling, supervision) is external to this
    // crate; the Chassis threads keep running until the process is torn
    // down. Parking the main thread here keeps `node` (and its Drop,
    // which stops every Chassis) alive for as long as the process is.
    loop {
        std::thread::park();
    }
}
