// Application layer: wires config, adapters and the opener engine for the binaries.

pub mod cli;
