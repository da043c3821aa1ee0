use std::io;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::Parser;

use chat_probe::{
    ChatProbe, Credential, ProbeConfig, ReplyFraming, DEFAULT_HOST, DEFAULT_PORT, RECV_BUFFER_SIZE,
};

/// Scripted then interactive client for line-oriented chat servers
#[derive(Parser)]
#[command(version)]
pub struct Args {
    /// Username sent as the first line; defaults to tester_<unix-timestamp>
    #[arg(long)]
    username: Option<String>,

    /// Password sent as the second line
    #[arg(long, default_value = "\n\n")]
    password: String,

    /// Commands sent in order before the interactive prompt
    #[arg(long, num_args = 1.., default_value = "hello")]
    commands: Vec<String>,

    #[arg(long, default_value = DEFAULT_HOST)]
    server_ip: String,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    server_port: u16,

    /// Pause between a send and its receive
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,

    /// Fail a receive that waits longer than this instead of blocking forever
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    read_timeout_ms: Option<u64>,

    /// Read each reply until it ends with this text instead of sleeping
    #[arg(long)]
    reply_delimiter: Option<String>,

    #[arg(long, default_value_t = RECV_BUFFER_SIZE)]
    recv_buffer: usize,
}

fn default_username() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("tester_{now}")
}

impl Args {
    fn into_config(self) -> ProbeConfig {
        let username = self.username.unwrap_or_else(default_username);
        let framing = match self.reply_delimiter {
            Some(delimiter) => ReplyFraming::Delimited(delimiter),
            None => ReplyFraming::FixedDelay(Duration::from_millis(self.delay_ms)),
        };

        ProbeConfig::new(
            self.server_ip,
            self.server_port,
            Credential::new(username, self.password),
        )
        .with_commands(self.commands)
        .with_framing(framing)
        .with_read_timeout(self.read_timeout_ms.map(Duration::from_millis))
        .with_recv_buffer(self.recv_buffer)
    }
}

/// Loggable view of the settings. The password stays out of it.
fn config_summary(config: &ProbeConfig) -> String {
    format!(
        "user: {}, commands: {:?}, framing: {:?}, read timeout: {:?}",
        config.credential.username, config.commands, config.framing, config.read_timeout
    )
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let probe = ChatProbe::new(args.into_config());
    log::debug!("{}", config_summary(probe.config()));
    log::info!(
        "Probing {}:{} as {}",
        probe.config().host,
        probe.config().port,
        probe.config().credential.username
    );

    let mut input = io::stdin().lock();
    let mut output = io::stdout().lock();
    probe.run_reported(&mut input, &mut output);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_original_script() {
        let config = Args::parse_from(["chat_probe"]).into_config();

        assert_eq!(config.commands, vec!["hello".to_string()]);
        assert_eq!(config.credential.password, "\n\n");
        assert!(config.credential.username.starts_with("tester_"));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 7878);
        assert_eq!(
            config.framing,
            ReplyFraming::FixedDelay(Duration::from_millis(500))
        );
        assert_eq!(config.read_timeout, None);
    }

    #[test]
    fn commands_take_several_values() {
        let args = Args::parse_from(["chat_probe", "--commands", "/help", "/rooms", "--server-port", "9000"]);

        assert_eq!(args.commands, vec!["/help", "/rooms"]);
        assert_eq!(args.server_port, 9000);
    }

    #[test]
    fn delimiter_switches_framing() {
        let config = Args::parse_from([
            "chat_probe",
            "--reply-delimiter",
            "): ",
            "--read-timeout-ms",
            "2000",
        ])
        .into_config();

        assert_eq!(config.framing, ReplyFraming::Delimited("): ".to_string()));
        assert_eq!(config.read_timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn zero_read_timeout_is_rejected() {
        let result = Args::try_parse_from(["chat_probe", "--read-timeout-ms", "0"]);

        assert!(result.is_err());
    }

    #[test]
    fn summary_leaves_out_the_password() {
        let config = Args::parse_from(["chat_probe", "--username", "bob", "--password", "hunter2"])
            .into_config();

        let summary = config_summary(&config);

        assert!(summary.contains("bob"));
        assert!(!summary.contains("hunter2"));
    }
}
