//! Build a TNG dataset from a directory of FITS files.
//!
//! ```text
//! cargo run --example build_dataset --features progress -- <fits_root> <out_dir> [train val test]
//! ```
//!
//! Set `TNG_LOG=debug` to follow file selection and eviction.
use std::env;

use camino::Utf8PathBuf;
use tng_dataset::{
    builder::TngDatasetBuilder, dataset::DirectoryWriter, logging::init_tracing,
    params::BuildParams, tng_errors::TngError,
};

fn parse_proportion(arg: &str) -> Result<f64, TngError> {
    arg.parse()
        .map_err(|_| TngError::InvalidBuildParameter(format!("not a proportion: {arg}")))
}

fn main() -> Result<(), TngError> {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() != 2 && args.len() != 5 {
        eprintln!("usage: build_dataset <fits_root> <out_dir> [train val test]");
        std::process::exit(2);
    }

    let mut params = BuildParams::builder();
    if let [_, _, train, val, test] = args.as_slice() {
        params = params.proportions(
            parse_proportion(train)?,
            parse_proportion(val)?,
            parse_proportion(test)?,
        );
    }
    let params = params.build()?;
    println!("{params:#}");

    let out = Utf8PathBuf::from(&args[1]);
    let mut builder = TngDatasetBuilder::new(args[0].as_str(), params)?;
    let mut sink = DirectoryWriter::create(&out, builder.params().image_side)?;

    let report = builder.build_into(&mut sink)?;
    println!("{report:#}");
    Ok(())
}
