use clap::Parser;
use std::io::Write;
use std::process::ExitCode;

mod config;
mod control;
mod diagnostics;
mod error;
mod registry;
mod render;
mod topology;

use config::Config;
use control::{AttenuatorTransport, ControlClient, TcpTransport};
use error::{AttenError, Result};
use registry::Registry;
use topology::ChannelId;

// Raw argument shape; which combination was given decides the invocation.
// clap never renders help here (`-h` prints `render::USAGE`), so the fields
// carry no help strings.
#[derive(Parser, Debug)]
#[command(name = "atten")]
#[command(disable_help_flag = true, disable_version_flag = true)]
#[command(allow_negative_numbers = true)]
struct Cli {
    #[arg(short = 'h')]
    help: bool,

    #[arg(short = 'l')]
    list: bool,

    id: Option<String>,

    val: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Invocation {
    Help,
    List,
    Set { id: ChannelId, db: f64 },
}

impl Cli {
    fn invocation(self) -> Result<Invocation> {
        match (self.help, self.list, self.id, self.val) {
            (true, false, None, None) => Ok(Invocation::Help),
            (false, true, None, None) => Ok(Invocation::List),
            (false, false, Some(id), Some(val)) => {
                let id: ChannelId = id.parse().map_err(|_| {
                    AttenError::Usage(format!("channel id {:?} is not a non-negative integer", id))
                })?;
                // Negative values parse and are rejected later as out of range,
                // naming the channel; nan and inf are not attenuations at all.
                let db: f64 = val
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|db| db.is_finite())
                    .ok_or_else(|| {
                        AttenError::Usage(format!("attenuation {:?} is not a number", val))
                    })?;
                Ok(Invocation::Set { id, db })
            }
            _ => Err(AttenError::Usage(
                "expected exactly one of -h, -l or <id> <val>".to_string(),
            )),
        }
    }
}

fn parse_invocation<I, S>(args: I) -> Result<Invocation>
where
    I: IntoIterator<Item = S>,
    S: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(|e| {
        let first = e.to_string();
        let first = first.lines().next().unwrap_or("invalid arguments");
        AttenError::Usage(first.trim_start_matches("error: ").to_string())
    })?;
    cli.invocation()
}

/// Run a listing or a set against an already loaded configuration.
///
/// The registry is loaded before the transport is used, so a bad topology or
/// an unknown channel never results in a controller transaction.
fn execute<T: AttenuatorTransport>(
    invocation: &Invocation,
    config: &Config,
    transport: T,
    out: &mut dyn Write,
) -> Result<()> {
    match invocation {
        Invocation::Help => {
            out.write_all(render::USAGE.as_bytes())?;
        }
        Invocation::List => {
            let registry = Registry::load(&config.topology)?;
            out.write_all(render::render_listing(registry.list_paths()).as_bytes())?;
        }
        Invocation::Set { id, db } => {
            let registry = Registry::load(&config.topology)?;
            let channel = registry.resolve_channel(*id)?;
            let mut client = ControlClient::new(transport, config.max_db, config.tolerance_db);
            client.set(&channel, *db)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    diagnostics::init_logging();

    let result = parse_invocation(std::env::args_os()).and_then(|invocation| {
        let mut stdout = std::io::stdout().lock();
        if invocation == Invocation::Help {
            return execute(&invocation, &Config::default(), NoTransport, &mut stdout);
        }
        let config = Config::load()?;
        let transport = TcpTransport::new(config.controller.clone(), config.timeout());
        execute(&invocation, &config, transport, &mut stdout)
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err, &mut std::io::stderr().lock());
            ExitCode::from(&err)
        }
    }
}

/// One diagnostic line; usage errors are followed by the usage text.
fn report(err: &AttenError, err_out: &mut dyn Write) {
    // Nothing sensible is left to do if stderr itself is gone.
    let _ = writeln!(err_out, "{}", diagnostics::error_message(err.to_string()));
    if matches!(err, AttenError::Usage(_)) {
        let _ = err_out.write_all(render::USAGE.as_bytes());
    }
    let _ = err_out.flush();
}

/// Stand-in transport for `-h`, which never touches hardware.
struct NoTransport;

impl AttenuatorTransport for NoTransport {
    fn name(&self) -> &str {
        "none"
    }

    fn get_attenuation(&mut self, channel: ChannelId) -> Result<f64> {
        Err(AttenError::hardware(channel.get(), "no controller configured"))
    }

    fn set_attenuation(&mut self, channel: ChannelId, _db: f64) -> Result<Option<f64>> {
        Err(AttenError::hardware(channel.get(), "no controller configured"))
    }
}
