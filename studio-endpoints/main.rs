use std::{io, path::PathBuf, process::ExitCode, time::Duration};

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use clap_complete::Shell;
use clap_complete_nushell::Nushell;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::{Level, debug};
use types::{ApiConfig, Endpoint, EnvInputs, Mode, Overrides};
use utils::{ProbeOptions, check_backend_health_with};

const BIN_NAME: &str = "studio-endpoints";

fn generate_commands() -> Command {
    Command::new(BIN_NAME)
        .about("Resolve studio API endpoints and probe the backend")
        .subcommand_required(true)
        .args([
            Arg::new("env_file")
                .long("env-file")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .global(true)
                .help("Load variables from this file instead of .env"),
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .global(true)
                .help("TOML file with mode, api_url and assets_url"),
            Arg::new("production")
                .long("production")
                .action(ArgAction::SetTrue)
                .conflicts_with("development")
                .global(true)
                .help("Resolve as a production build"),
            Arg::new("development")
                .long("development")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Resolve as a development build"),
            Arg::new("api_url")
                .long("api-url")
                .value_name("URL")
                .global(true)
                .help("API root override")
                .long_help("API root override. Only honoured in production, development always uses /api"),
            Arg::new("assets_url")
                .long("assets-url")
                .value_name("URL")
                .global(true)
                .help("Assets root override")
                .long_help("Assets root override. Only honoured in production, development always uses /assets"),
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("More logging, repeat for trace output"),
        ])
        .subcommands([
            Command::new("show").about("Print the resolved configuration as JSON"),
            Command::new("endpoints").about("List endpoint keys and their paths"),
            Command::new("url").about("Print the full API URL of an endpoint").arg(
                Arg::new("endpoint")
                    .required(true)
                    .help("Endpoint key such as chatClear, or a raw path starting with /"),
            ),
            Command::new("asset")
                .about("Print the full URL of a static asset")
                .arg(Arg::new("path").required(true)),
            Command::new("health")
                .about("Probe the backend health endpoint, exits non-zero when unreachable")
                .args([
                    Arg::new("timeout_secs")
                        .long("timeout-secs")
                        .value_name("SECS")
                        .value_parser(value_parser!(u64))
                        .help("Give up after this many seconds, waits indefinitely when unset"),
                    Arg::new("origin")
                        .long("origin")
                        .value_name("URL")
                        .help("Origin for a relative health URL, defaults to the backend URL"),
                ]),
            Command::new("completions")
                .about("Generate shell completions")
                .arg(Arg::new("shell").required(true).value_parser([
                    "bash",
                    "elvish",
                    "fish",
                    "nushell",
                    "powershell",
                    "zsh",
                ])),
        ])
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn cli_overrides(matches: &ArgMatches) -> Overrides {
    let mode = if matches.get_flag("production") {
        Some(Mode::Production)
    } else if matches.get_flag("development") {
        Some(Mode::Development)
    } else {
        None
    };
    Overrides {
        mode,
        api_url: matches.get_one::<String>("api_url").cloned(),
        assets_url: matches.get_one::<String>("assets_url").cloned(),
    }
}

/// Environment, then the config file, then flags
fn load_inputs(matches: &ArgMatches) -> Result<EnvInputs> {
    match matches.get_one::<PathBuf>("env_file") {
        Some(path) => {
            dotenvy::from_path(path)
                .wrap_err_with(|| format!("Failed to load {}", path.display()))?;
        }
        None => {
            if let Ok(path) = dotenvy::dotenv() {
                debug!("Loaded {}", path.display());
            }
        }
    }
    let mut inputs = EnvInputs::from_env();
    if let Some(path) = matches.get_one::<PathBuf>("config") {
        let source = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        inputs = inputs.apply(Overrides::from_toml(&source)?);
    }
    Ok(inputs.apply(cli_overrides(matches)))
}

fn url_for(config: &ApiConfig, target: &str) -> Result<String> {
    if target.starts_with('/') {
        return Ok(config.get_api_url(target));
    }
    let endpoint = target.parse::<Endpoint>()?;
    Ok(config.endpoint_url(endpoint))
}

fn print_completions(shell: &str) -> Result<()> {
    let mut command = generate_commands();
    let mut out = io::stdout();
    if shell == "nushell" {
        clap_complete::generate(Nushell, &mut command, BIN_NAME, &mut out);
    } else {
        let shell = shell.parse::<Shell>().map_err(|e| eyre!(e))?;
        clap_complete::generate(shell, &mut command, BIN_NAME, &mut out);
    }
    Ok(())
}

fn probe_options(matches: &ArgMatches) -> ProbeOptions {
    let mut options = ProbeOptions::default();
    if let Some(secs) = matches.get_one::<u64>("timeout_secs") {
        options = options.with_timeout(Duration::from_secs(*secs));
    }
    if let Some(origin) = matches.get_one::<String>("origin") {
        options = options.with_origin(origin);
    }
    options
}

fn run(matches: ArgMatches) -> Result<ExitCode> {
    if let Some(("completions", sub)) = matches.subcommand() {
        let shell = sub
            .get_one::<String>("shell")
            .ok_or_else(|| eyre!("missing shell"))?;
        print_completions(shell)?;
        return Ok(ExitCode::SUCCESS);
    }

    let inputs = load_inputs(&matches)?;
    let config = ApiConfig::init_global(&inputs)?;

    match matches.subcommand() {
        Some(("show", _)) => println!("{}", serde_json::to_string_pretty(config)?),
        Some(("endpoints", _)) => {
            for (key, path) in config.endpoints.iter() {
                println!("{key:<24} {path}");
            }
        }
        Some(("url", sub)) => {
            let target = sub
                .get_one::<String>("endpoint")
                .ok_or_else(|| eyre!("missing endpoint"))?;
            println!("{}", url_for(config, target)?);
        }
        Some(("asset", sub)) => {
            let path = sub
                .get_one::<String>("path")
                .ok_or_else(|| eyre!("missing path"))?;
            println!("{}", config.get_assets_url(path));
        }
        Some(("health", sub)) => {
            let options = probe_options(sub);
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let healthy = runtime.block_on(check_backend_health_with(config, &options));
            if healthy {
                println!("healthy");
                return Ok(ExitCode::SUCCESS);
            }
            println!("unreachable");
            return Ok(ExitCode::FAILURE);
        }
        Some((other, _)) => return Err(eyre!("unknown command `{other}`")),
        None => return Err(eyre!("no command given")),
    }
    Ok(ExitCode::SUCCESS)
}

// Variables are loaded before any runtime threads exist
fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let matches = generate_commands().get_matches();
    init_tracing(matches.get_count("verbose"))?;
    run(matches)
}
