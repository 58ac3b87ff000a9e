use anyhow::{anyhow, bail, Context, Result};
use std::{path::PathBuf, str::FromStr};

use vocalprep_core::{SlicerConfig, WavFormat};
use vocalprep_tools::{manifest::SplitRule, segment::SliceOptions};

pub const CONFIG_ENV: &str = "VOCALPREP_CONFIG";
pub const DEFAULT_CONFIG: &str = "datasets.yaml";

pub const USAGE: &str = "\
Usage: vocalprep [--config <file>] <command> [options]

Commands:
  collect   [--dataset M4Singer] [--target <dir>]
  slice     [--dataset ProSinger] [--singer <name>] [--threshold <dB>] [--min-length <ms>]
            [--min-interval <ms>] [--hop-size <ms>] [--max-sil-kept <ms>]
            [--sample-rate <Hz>] [--pcm16]
  manifest  [--dataset ProSinger] [--train-below <id>] [--test-below <id>]
  stats     [--dataset ProSinger]";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Collect {
        dataset: String,
        target: Option<PathBuf>,
    },
    Slice(SliceOptions),
    Manifest {
        dataset: String,
        rule: SplitRule,
    },
    Stats {
        dataset: String,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cli {
    pub config: PathBuf,
    pub command: Command,
}

fn value<T: FromStr>(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = args
        .next()
        .ok_or_else(|| anyhow!("{flag} requires a value"))?;
    raw.parse::<T>()
        .with_context(|| format!("Invalid value '{raw}' for {flag}"))
}

/// Parse the command line, `args` excluding the program name.
///
/// `env_config` is the value of `VOCALPREP_CONFIG`, used when `--config` is absent.
pub fn parse(args: impl IntoIterator<Item = String>, env_config: Option<String>) -> Result<Cli> {
    let mut args = args.into_iter();
    let mut config: Option<PathBuf> = None;

    let command_name = loop {
        match args.next() {
            Some(arg) if arg == "--config" || arg == "-c" => {
                config = Some(value(&mut args, &arg)?);
            }
            Some(arg) if arg == "-h" || arg == "--help" => break "help".to_string(),
            Some(arg) => break arg,
            None => break "help".to_string(),
        }
    };

    let mut dataset: Option<String> = None;
    let command = match command_name.as_str() {
        "collect" => {
            let mut target = None;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--dataset" => dataset = Some(value(&mut args, &arg)?),
                    "--target" => target = Some(value(&mut args, &arg)?),
                    other => bail!("Unknown option '{}' for collect", other),
                }
            }
            Command::Collect {
                dataset: dataset.unwrap_or_else(|| "M4Singer".to_string()),
                target,
            }
        }
        "slice" => {
            let mut options = SliceOptions::default();
            let mut slicer = SlicerConfig::default();
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--dataset" => options.dataset = value(&mut args, &arg)?,
                    "--singer" => options.singer = value(&mut args, &arg)?,
                    "--threshold" => slicer.threshold_db = value(&mut args, &arg)?,
                    "--min-length" => slicer.min_length_ms = value(&mut args, &arg)?,
                    "--min-interval" => slicer.min_interval_ms = value(&mut args, &arg)?,
                    "--hop-size" => slicer.hop_size_ms = value(&mut args, &arg)?,
                    "--max-sil-kept" => slicer.max_sil_kept_ms = value(&mut args, &arg)?,
                    "--sample-rate" => options.sample_rate = Some(value(&mut args, &arg)?),
                    "--pcm16" => options.format = WavFormat::Pcm16,
                    other => bail!("Unknown option '{}' for slice", other),
                }
            }
            // Validated before the registry is loaded.
            slicer.validate()?;
            options.slicer = slicer;
            Command::Slice(options)
        }
        "manifest" => {
            let mut rule = SplitRule::default();
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--dataset" => dataset = Some(value(&mut args, &arg)?),
                    "--train-below" => rule.train_below = value(&mut args, &arg)?,
                    "--test-below" => rule.test_below = value(&mut args, &arg)?,
                    other => bail!("Unknown option '{}' for manifest", other),
                }
            }
            if rule.test_below < rule.train_below {
                bail!(
                    "--test-below ({}) must not be smaller than --train-below ({})",
                    rule.test_below,
                    rule.train_below
                );
            }
            Command::Manifest {
                dataset: dataset.unwrap_or_else(|| "ProSinger".to_string()),
                rule,
            }
        }
        "stats" => {
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--dataset" => dataset = Some(value(&mut args, &arg)?),
                    other => bail!("Unknown option '{}' for stats", other),
                }
            }
            Command::Stats {
                dataset: dataset.unwrap_or_else(|| "ProSinger".to_string()),
            }
        }
        "help" => Command::Help,
        other => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    };

    let config = config
        .or_else(|| env_config.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    Ok(Cli { config, command })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_slice_defaults_match_prosinger_script() {
        let cli = parse(args("slice"), None).unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG));

        let Command::Slice(options) = cli.command else {
            panic!("expected slice command");
        };
        assert_eq!(options.dataset, "ProSinger");
        assert_eq!(options.singer, "李健");
        assert_eq!(options.slicer, SlicerConfig::default());
        assert_eq!(options.sample_rate, None);
        assert_eq!(options.format, WavFormat::Float32);
    }

    #[test]
    fn test_slice_overrides() {
        let cli = parse(
            args("--config reg.yaml slice --singer 周深 --threshold -35.5 --hop-size 20 --max-sil-kept 800 --sample-rate 24000 --pcm16"),
            Some("ignored.yaml".to_string()),
        )
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("reg.yaml"));

        let Command::Slice(options) = cli.command else {
            panic!("expected slice command");
        };
        assert_eq!(options.singer, "周深");
        assert_eq!(options.slicer.threshold_db, -35.5);
        assert_eq!(options.slicer.hop_size_ms, 20);
        assert_eq!(options.slicer.max_sil_kept_ms, 800);
        assert_eq!(options.sample_rate, Some(24_000));
        assert_eq!(options.format, WavFormat::Pcm16);
    }

    #[test]
    fn test_slice_rejects_bad_ordering() {
        let err = parse(args("slice --min-interval 5"), None).unwrap_err();
        assert!(err.to_string().contains("min_interval"));
    }

    #[test]
    fn test_config_from_env() {
        let cli = parse(args("stats --dataset M4Singer"), Some("/etc/vp.yaml".to_string())).unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/vp.yaml"));
        assert_eq!(
            cli.command,
            Command::Stats {
                dataset: "M4Singer".to_string()
            }
        );
    }

    #[test]
    fn test_manifest_and_collect() {
        let cli = parse(args("manifest --train-below 40 --test-below 45"), None).unwrap();
        assert_eq!(
            cli.command,
            Command::Manifest {
                dataset: "ProSinger".to_string(),
                rule: SplitRule {
                    train_below: 40,
                    test_below: 45
                },
            }
        );
        assert!(parse(args("manifest --train-below 40 --test-below 30"), None).is_err());

        let cli = parse(args("collect --target /tmp/out"), None).unwrap();
        assert_eq!(
            cli.command,
            Command::Collect {
                dataset: "M4Singer".to_string(),
                target: Some(PathBuf::from("/tmp/out")),
            }
        );
    }

    #[test]
    fn test_errors_and_help() {
        assert_eq!(parse(Vec::new(), None).unwrap().command, Command::Help);
        assert_eq!(parse(args("--help"), None).unwrap().command, Command::Help);
        assert!(parse(args("train"), None).is_err());
        assert!(parse(args("slice --bogus"), None).is_err());
        assert!(parse(args("slice --hop-size"), None).is_err());
        assert!(parse(args("slice --hop-size ten"), None).is_err());
    }
}
