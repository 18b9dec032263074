use std::path::PathBuf;

use clap::{value_parser, Arg, ArgMatches, Command};
use wizexport_lib::ExportConfig;

pub fn gen_app() -> Command<'static> {
    Command::new("wizexport")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Exports WizNote notes into local HTML files, one directory per folder")
        .arg(Arg::new("user")
            .short('u')
            .long("user")
            .help("WizNote login ID")
            .required(true)
            .takes_value(true)
            .value_parser(value_parser!(String))
        )
        .arg(Arg::new("password")
            .short('p')
            .long("password")
            .help("WizNote password")
            .required(true)
            .takes_value(true)
            .value_parser(value_parser!(String))
        )
        .arg(Arg::new("output")
            .short('o')
            .long("output")
            .help("Output folder path")
            .required(true)
            .takes_value(true)
            .value_parser(value_parser!(PathBuf))
        )
        .arg(Arg::new("api_url")
            .short('a')
            .long("api_url")
            .help("URL of the WizNote API server")
            .required(true)
            .takes_value(true)
            .value_parser(value_parser!(String))
        )
}

/// None if one of the required arguments is missing
pub fn config_from_matches(matches: &ArgMatches) -> Option<ExportConfig> {
    let user = matches.get_one::<String>("user")?;
    let password = matches.get_one::<String>("password")?;
    let output = matches.get_one::<PathBuf>("output")?;
    let api_url = matches.get_one::<String>("api_url")?;

    Some(ExportConfig::new(user, password, output.clone(), api_url))
}
