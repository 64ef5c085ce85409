use clap::Parser;

pub const VERSION: &str = "v0.1.0";

#[derive(Parser)]
#[command(
    name = "rollup-machine-manager",
    version = VERSION,
    about = "Manager of rollup sessions backed by cartesi machine servers",
    long_about = None
)]
pub struct Cli {
    /// Address the manager binds to: <host>:<port> or unix:<path>
    #[arg(long)]
    pub manager_address: String,

    /// Address suggested to spawned machine servers
    #[arg(long, default_value = "localhost:0")]
    pub server_address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_addresses() {
        let cli = Cli::parse_from([
            "rollup-machine-manager",
            "--manager-address=localhost:5001",
        ]);
        assert_eq!(cli.manager_address, "localhost:5001");
        assert_eq!(cli.server_address, "localhost:0");
    }

    #[test]
    fn manager_address_is_required() {
        assert!(Cli::try_parse_from(["rollup-machine-manager"]).is_err());
    }
}
