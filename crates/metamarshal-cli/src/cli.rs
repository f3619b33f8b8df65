use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mmarshal",
    about = "Inspect and verify marshal 4.8 files",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with a `[generator]` table
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Maximum nesting when re-generating; negative means unlimited
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub depth_limit: Option<i64>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse a file and print its graph
    Inspect(InspectArgs),
    /// Check that a file re-generates byte for byte
    Verify(VerifyArgs),
    /// Dump a file as hex
    Hex(HexArgs),
}

#[derive(Args)]
pub struct InspectArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub files: Vec<PathBuf>,
}

#[derive(Args)]
pub struct HexArgs {
    pub file: PathBuf,
    /// Bytes per line
    #[arg(short, long, default_value = "16")]
    pub width: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_inspect() {
        let cli = Cli::try_parse_from(["mmarshal", "inspect", "a.bin"]).unwrap();
        if let Command::Inspect(args) = cli.command {
            assert_eq!(args.file, PathBuf::from("a.bin"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_verify_many() {
        let cli = Cli::try_parse_from(["mmarshal", "verify", "a.bin", "b.bin"]).unwrap();
        if let Command::Verify(args) = cli.command {
            assert_eq!(args.files.len(), 2);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_hex_width() {
        let cli = Cli::try_parse_from(["mmarshal", "hex", "-w", "8", "a.bin"]).unwrap();
        if let Command::Hex(args) = cli.command {
            assert_eq!(args.width, 8);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_depth_limit() {
        let cli =
            Cli::try_parse_from(["mmarshal", "--depth-limit", "3", "verify", "a.bin"]).unwrap();
        assert_eq!(cli.depth_limit, Some(3));
    }

    #[test]
    fn parse_negative_depth_limit() {
        let cli =
            Cli::try_parse_from(["mmarshal", "verify", "--depth-limit", "-1", "a.bin"]).unwrap();
        assert_eq!(cli.depth_limit, Some(-1));
    }

    #[test]
    fn parse_config_path() {
        let cli =
            Cli::try_parse_from(["mmarshal", "--config", "m.toml", "inspect", "a.bin"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("m.toml")));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["mmarshal", "--verbose", "inspect", "a.bin"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["mmarshal", "--format", "json", "inspect", "a.bin"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn missing_file_is_rejected() {
        assert!(Cli::try_parse_from(["mmarshal", "inspect"]).is_err());
    }
}
