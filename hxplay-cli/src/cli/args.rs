//! CLI argument definitions for `hxplay`.

use clap::{Arg, ArgAction, Command};

fn manifest_arg() -> Arg {
    Arg::new("MANIFEST")
        .help("Path to a resource graph manifest (JSON)")
        .required(true)
        .index(1)
}

fn cuuid_arg() -> Arg {
    Arg::new("CUUID")
        .help("Entry id in hex, with or without 0x")
        .required(true)
        .index(2)
}

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("hxplay")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Browse and play .hx audio resource graphs")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list")
                .about("List the events of a graph")
                .arg(manifest_arg())
                .arg(
                    Arg::new("all")
                        .long("all")
                        .short('a')
                        .action(ArgAction::SetTrue)
                        .help("List every entry with its class, not only events"),
                ),
        )
        .subcommand(
            Command::new("tree")
                .about("Print the link tree below an entry")
                .arg(manifest_arg())
                .arg(cuuid_arg()),
        )
        .subcommand(
            Command::new("resolve")
                .about("Print the streams an event resolves to, without playing")
                .arg(manifest_arg())
                .arg(cuuid_arg()),
        )
        .subcommand(
            Command::new("info")
                .about("Print the fields of one entry")
                .arg(manifest_arg())
                .arg(cuuid_arg()),
        )
        .subcommand(
            Command::new("play")
                .about("Resolve an event and play it")
                .arg(manifest_arg())
                .arg(cuuid_arg())
                .arg(
                    Arg::new("gain")
                        .long("gain")
                        .short('g')
                        .value_name("GAIN")
                        .value_parser(clap::value_parser!(f32))
                        .help("Mix gain, 0.0-1.0"),
                )
                .arg(
                    Arg::new("repeat")
                        .long("repeat")
                        .short('r')
                        .action(ArgAction::SetTrue)
                        .help("Loop the queue"),
                )
                .arg(
                    Arg::new("period")
                        .long("period")
                        .value_name("FRAMES")
                        .value_parser(clap::value_parser!(usize))
                        .help("Frames per device callback"),
                )
                .arg(
                    Arg::new("settings")
                        .long("settings")
                        .short('s')
                        .value_name("PATH")
                        .help("Path to a JSON file with playback settings"),
                )
                .arg(
                    Arg::new("null-output")
                        .long("null-output")
                        .action(ArgAction::SetTrue)
                        .help("Discard audio instead of opening a sound device"),
                )
                .arg(
                    Arg::new("quiet")
                        .long("quiet")
                        .short('q')
                        .action(ArgAction::SetTrue)
                        .help("Print plain status lines instead of the interactive view"),
                ),
        )
}
