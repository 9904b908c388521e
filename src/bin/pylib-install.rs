/*
 * Copyright 2022 Collabora, Ltd.
 *
 * SPDX-License-Identifier: MIT
 */
use anyhow::Result;
use pylib_install::install::run;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "pylib-install",
    long_about = "Install Python library files into the system package directory."
)]
struct Opt {
    #[structopt(
        name = "MANIFEST",
        help = "Manifest listing the files to install; *.py files in the current directory when omitted."
    )]
    manifest: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();

    let opt = Opt::from_args();
    for target in run(opt.manifest)? {
        println!("{}", target.destination.to_string_lossy());
    }
    Ok(())
}
