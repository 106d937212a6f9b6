use anyhow::{Context, Result};
use chrono::Weekday;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uniflow_core::time::parse_timezone;
use uniflow_core::reminders::MAX_LEAD_MINUTES;
use uniflow_core::ReminderPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub reminders: RemindersSection,
    #[serde(default)]
    pub calendar: CalendarSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address `uniflow serve` listens on.
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemindersSection {
    /// When false, task edits never call the reminder service.
    pub enabled: bool,
    pub base_url: String,
    /// Minutes before the deadline that a reminder fires.
    pub lead_minutes: i64,
    pub timeout_secs: u64,
    /// Extra attempts after a transport error or 5xx.
    pub retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSection {
    /// IANA zone whose calendar days group deadlines.
    pub timezone: String,
    pub week_starts_on: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5001".to_string(),
        }
    }
}

impl Default for RemindersSection {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://127.0.0.1:5001".to_string(),
            lead_minutes: ReminderPolicy::default().lead_minutes,
            timeout_secs: 5,
            retries: 0,
        }
    }
}

impl Default for CalendarSection {
    fn default() -> Self {
        Self {
            timezone: "America/Chicago".to_string(),
            week_starts_on: "monday".to_string(),
        }
    }
}

impl Config {
    pub fn timezone(&self) -> Result<Tz> {
        parse_timezone(&self.calendar.timezone)
    }

    pub fn week_starts_on(&self) -> Result<Weekday> {
        self.calendar
            .week_starts_on
            .parse::<Weekday>()
            .map_err(|_| anyhow::anyhow!("invalid week_starts_on: {}", self.calendar.week_starts_on))
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .with_context(|| format!("invalid server.bind: {}", self.server.bind))
    }

    pub fn reminder_policy(&self) -> ReminderPolicy {
        ReminderPolicy {
            lead_minutes: self.reminders.lead_minutes,
        }
    }

    pub fn reminder_timeout(&self) -> Duration {
        Duration::from_secs(self.reminders.timeout_secs)
    }

    /// Reject values that would only fail later, mid-command.
    pub fn validate(&self) -> Result<()> {
        self.timezone()?;
        self.week_starts_on()?;
        self.bind_addr()?;
        if !(0..=MAX_LEAD_MINUTES).contains(&self.reminders.lead_minutes) {
            anyhow::bail!(
                "reminders.lead_minutes must be between 0 and {MAX_LEAD_MINUTES}, got {}",
                self.reminders.lead_minutes
            );
        }
        Ok(())
    }
}

pub fn config_path(home: &Path) -> PathBuf {
    home.join("config.toml")
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: Config = toml::from_str(&s).context("parse config.toml")?;
    cfg.validate()
        .with_context(|| format!("check {}", path.display()))?;
    Ok(cfg)
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }
    save_config(path, &Config::default())?;
    println!("Wrote {}", path.display());
    Ok(())
}

pub fn show_config(path: &Path) -> Result<()> {
    let cfg = load_config(path)?;
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&config_path(dir.path())).unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1:5001");
        assert_eq!(cfg.reminders.lead_minutes, 15);
        assert!(cfg.reminders.enabled);
        assert_eq!(cfg.timezone().unwrap(), chrono_tz::America::Chicago);
        assert_eq!(cfg.week_starts_on().unwrap(), Weekday::Mon);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_path(dir.path());
        fs::write(
            &path,
            "[reminders]\nenabled = false\n\n[calendar]\ntimezone = \"Europe/London\"\n",
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert!(!cfg.reminders.enabled);
        assert_eq!(cfg.reminders.base_url, "http://127.0.0.1:5001");
        assert_eq!(cfg.timezone().unwrap(), chrono_tz::Europe::London);
        assert_eq!(cfg.calendar.week_starts_on, "monday");
    }

    #[test]
    fn init_writes_once_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_path(dir.path());
        init_config(&path).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        init_config(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), first);

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.bind_addr().unwrap().port(), 5001);
    }

    #[test]
    fn lead_minutes_out_of_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_path(dir.path());
        for bad in ["-1", "200000000000", "9223372036854775807"] {
            fs::write(&path, format!("[reminders]\nlead_minutes = {bad}\n")).unwrap();
            assert!(load_config(&path).is_err(), "accepted lead_minutes = {bad}");
        }

        fs::write(&path, format!("[reminders]\nlead_minutes = {MAX_LEAD_MINUTES}\n")).unwrap();
        assert_eq!(load_config(&path).unwrap().reminders.lead_minutes, MAX_LEAD_MINUTES);
    }

    #[test]
    fn bad_timezone_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_path(dir.path());
        fs::write(&path, "[calendar]\ntimezone = \"Mars/Olympus\"\n").unwrap();
        assert!(load_config(&path).is_err());
    }
}
