//! A demo driver that walks an Atoll ring through membership changes
//!
//! This adds servers, assigns keys and then changes the node set so you can
//! watch which keys migrate and which stay put.

use clap::Parser;
use owo_colors::OwoColorize;

use atoll_core::{trace, AtollError, Conf, Ring, RingError};

mod args;

use args::Args;

/// Print the keys currently living on each node
///
/// # Arguments
///
/// * `ring` - The ring to display
/// * `header` - The header to print above the distribution
fn display(ring: &Ring, header: &str) {
    println!("\n{}", header.bold());
    // node names come back sorted so output is stable
    for node in ring.nodes() {
        println!("  {}: {:?}", node.green(), ring.keys_of(node));
    }
}

fn main() -> Result<(), AtollError> {
    // parse our command line args
    let args = Args::parse();
    // load our config
    let conf = Conf::new(&args.conf)?;
    // setup tracing
    trace::setup(&conf);
    // build an empty ring from our config
    let mut ring = Ring::from_conf(&conf);
    // add our initial servers
    for server in ["Server1", "Server2", "Server3"] {
        ring.add_node(server);
    }
    // assign our keys
    for key in ["Key1", "Key2", "Key3", "Key4", "Key5"] {
        ring.assign_key(key)?;
    }
    display(&ring, "Initial Key Distribution:");
    // add another server and watch the bounded migration
    ring.add_node("Server4");
    display(&ring, "Updated Key Distribution:");
    // remove a server, surfacing any dropped keys
    match ring.remove_node("Server2") {
        Ok(()) => (),
        Err(RingError::KeyLoss { node, keys }) => {
            println!("{} {node} dropped {keys:?}", "lost keys:".red());
        }
        Err(error) => return Err(AtollError::from(error)),
    }
    display(&ring, "Final Key Distribution:");
    Ok(())
}
